use serde_json::json;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, Negotiation, NegotiationStatus};
use crate::deals::error::DealError;
use crate::deals::repository::{NegotiationDocumentsRepository, NegotiationsRepository};

use super::{cancel_negotiation, ensure_status, AwaitingSignatures, Cancelled};

/// CONTRACT_DRAFTING behavior: terms fixed, contract being written up.
pub struct ContractDrafting {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl ContractDrafting {
    /// A deal cannot legitimately reach contract drafting without a selling
    /// broker; a row that did is corrupt and refuses to hydrate.
    pub(crate) fn new(
        negotiation: Negotiation,
        ctx: NegotiationContext,
    ) -> Result<Self, DealError> {
        if negotiation.selling_broker_id.is_none() {
            return Err(DealError::CorruptState {
                negotiation_id: negotiation.id.clone(),
                reason: "contract drafting requires an assigned selling broker".to_string(),
            });
        }
        Ok(Self { negotiation, ctx })
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Attach the signed-ready contract document and move the deal to
    /// signature collection. The blob and the transition commit together.
    pub fn upload_final_contract(
        self,
        actor_id: &ActorId,
        content: Vec<u8>,
    ) -> Result<AwaitingSignatures, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ContractDrafting)?;
        let metadata = json!({
            "operation": "upload_final_contract",
            "content_bytes": content.len(),
        });
        let Self { negotiation, ctx } = self;
        let advanced = ctx.transactions.run(|tx| {
            let advanced = NegotiationsRepository::transition(
                tx,
                &negotiation,
                NegotiationStatus::AwaitingSignatures,
                actor_id,
                metadata,
            )?;
            NegotiationDocumentsRepository::store_final_contract(tx, &advanced.id, content);
            Ok(advanced)
        })?;
        Ok(AwaitingSignatures::new(advanced, ctx))
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ContractDrafting)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }
}
