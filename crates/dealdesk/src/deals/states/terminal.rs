use crate::deals::domain::Negotiation;

/// Terminal SOLD state. Holds the closed row for inspection; no operation
/// leaves it.
pub struct Sold {
    negotiation: Negotiation,
}

impl Sold {
    pub(crate) fn new(negotiation: Negotiation) -> Self {
        Self { negotiation }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }
}

/// Terminal RENTED state.
pub struct Rented {
    negotiation: Negotiation,
}

impl Rented {
    pub(crate) fn new(negotiation: Negotiation) -> Self {
        Self { negotiation }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }
}

/// Terminal CANCELLED state.
pub struct Cancelled {
    negotiation: Negotiation,
}

impl Cancelled {
    pub(crate) fn new(negotiation: Negotiation) -> Self {
        Self { negotiation }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }
}
