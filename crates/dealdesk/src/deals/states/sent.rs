use serde_json::json;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, Negotiation, NegotiationStatus};
use crate::deals::error::DealError;
use crate::deals::repository::{NegotiationsRepository, PropertiesRepository};

use super::{cancel_negotiation, ensure_status, Cancelled, InNegotiation};

/// PROPOSAL_SENT behavior: waiting for the client's answer.
pub struct ProposalSent {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl ProposalSent {
    pub(crate) fn new(negotiation: Negotiation, ctx: NegotiationContext) -> Self {
        Self { negotiation, ctx }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Client accepted the proposal. Moves the deal into negotiation and
    /// takes the listing off the public market in the same transaction.
    pub fn approve_proposal(self, actor_id: &ActorId) -> Result<InNegotiation, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ProposalSent)?;
        let Self { negotiation, ctx } = self;
        let approved = ctx.transactions.run(|tx| {
            let advanced = NegotiationsRepository::transition(
                tx,
                &negotiation,
                NegotiationStatus::InNegotiation,
                actor_id,
                json!({ "operation": "approve_proposal" }),
            )?;
            PropertiesRepository::mark_under_negotiation(tx, &advanced.property_id)?;
            Ok(advanced)
        })?;
        Ok(InNegotiation::new(approved, ctx))
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ProposalSent)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }
}
