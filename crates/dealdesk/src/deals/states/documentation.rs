use serde_json::json;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, Negotiation, NegotiationStatus};
use crate::deals::error::{DealError, ValidationError};
use crate::deals::repository::{NegotiationDocumentsRepository, NegotiationsRepository};

use super::{cancel_negotiation, ensure_status, Cancelled, ContractDrafting};

/// DOCUMENTATION_PHASE behavior: supporting documents under review.
pub struct DocumentationPhase {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl DocumentationPhase {
    pub(crate) fn new(negotiation: Negotiation, ctx: NegotiationContext) -> Self {
        Self { negotiation, ctx }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Advance to contract drafting once the paperwork clears. The gate
    /// counts supporting documents inside the transition's transaction: none
    /// may be pending or rejected and at least one must be approved.
    /// Generated artifacts never count.
    pub fn begin_contract_drafting(
        self,
        actor_id: &ActorId,
    ) -> Result<ContractDrafting, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::DocumentationPhase)?;
        if self.negotiation.selling_broker_id.is_none() {
            return Err(ValidationError::SellingBrokerRequired.into());
        }
        let Self { negotiation, ctx } = self;
        let advanced = ctx.transactions.run(|tx| {
            let unresolved =
                NegotiationDocumentsRepository::count_pending_or_rejected(tx, &negotiation.id);
            if unresolved > 0 {
                return Err(ValidationError::DocumentsAwaitingReview {
                    pending_or_rejected: unresolved,
                }
                .into());
            }
            if NegotiationDocumentsRepository::count_approved(tx, &negotiation.id) == 0 {
                return Err(ValidationError::NoApprovedDocuments.into());
            }
            NegotiationsRepository::transition(
                tx,
                &negotiation,
                NegotiationStatus::ContractDrafting,
                actor_id,
                json!({ "operation": "begin_contract_drafting" }),
            )
        })?;
        ContractDrafting::new(advanced, ctx)
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::DocumentationPhase)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }
}
