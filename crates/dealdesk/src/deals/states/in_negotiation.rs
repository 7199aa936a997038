use serde_json::json;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, Negotiation, NegotiationStatus};
use crate::deals::error::DealError;
use crate::deals::repository::NegotiationsRepository;

use super::{cancel_negotiation, ensure_status, Cancelled, DocumentationPhase};

/// IN_NEGOTIATION behavior: terms agreed in principle, paperwork not yet
/// requested.
pub struct InNegotiation {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl InNegotiation {
    pub(crate) fn new(negotiation: Negotiation, ctx: NegotiationContext) -> Self {
        Self { negotiation, ctx }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Ask the client for supporting documents.
    pub fn request_documentation(self, actor_id: &ActorId) -> Result<DocumentationPhase, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::InNegotiation)?;
        let Self { negotiation, ctx } = self;
        let advanced = ctx.transactions.run(|tx| {
            NegotiationsRepository::transition(
                tx,
                &negotiation,
                NegotiationStatus::DocumentationPhase,
                actor_id,
                json!({ "operation": "request_documentation" }),
            )
        })?;
        Ok(DocumentationPhase::new(advanced, ctx))
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::InNegotiation)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }
}
