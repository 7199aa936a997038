use serde_json::json;
use tracing::info;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, Negotiation, NegotiationStatus, PropertyLifecycle};
use crate::deals::error::DealError;
use crate::deals::events::DealClosedEvent;
use crate::deals::repository::{NegotiationsRepository, PropertiesRepository};

use super::{cancel_negotiation, ensure_status, Cancelled, Rented, Sold};

/// AWAITING_SIGNATURES behavior: the contract is out for signing and the
/// deal can close either way.
pub struct AwaitingSignatures {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl AwaitingSignatures {
    pub(crate) fn new(negotiation: Negotiation, ctx: NegotiationContext) -> Self {
        Self { negotiation, ctx }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Close the deal as a sale.
    pub fn mark_sold(self, actor_id: &ActorId) -> Result<Sold, DealError> {
        let closed = self.close(
            actor_id,
            NegotiationStatus::Sold,
            PropertyLifecycle::Sold,
            "mark_sold",
        )?;
        Ok(Sold::new(closed))
    }

    /// Close the deal as a rental.
    pub fn mark_rented(self, actor_id: &ActorId) -> Result<Rented, DealError> {
        let closed = self.close(
            actor_id,
            NegotiationStatus::Rented,
            PropertyLifecycle::Rented,
            "mark_rented",
        )?;
        Ok(Rented::new(closed))
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::AwaitingSignatures)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }

    fn close(
        self,
        actor_id: &ActorId,
        to_status: NegotiationStatus,
        lifecycle: PropertyLifecycle,
        operation: &'static str,
    ) -> Result<Negotiation, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::AwaitingSignatures)?;
        let metadata = json!({
            "operation": operation,
            "final_value": self.negotiation.final_value,
        });
        let Self { negotiation, ctx } = self;
        let closed = ctx.transactions.run(|tx| {
            let advanced = NegotiationsRepository::transition(
                tx,
                &negotiation,
                to_status,
                actor_id,
                metadata,
            )?;
            PropertiesRepository::set_lifecycle(tx, &advanced.property_id, lifecycle)?;
            Ok(advanced)
        })?;

        // Settlement opens its own transaction, so the event must not fire
        // until this one has committed.
        ctx.events.emit_deal_closed(DealClosedEvent {
            negotiation_id: closed.id.clone(),
        });
        info!(
            negotiation_id = %closed.id,
            status = closed.status.label(),
            "deal closed"
        );
        Ok(closed)
    }
}
