//! Behavior objects for each lifecycle status. The factory wraps a persisted
//! negotiation row in the state matching its status; every mutating method
//! consumes the state, runs one transaction conditioned on the wrapped
//! snapshot, and returns the follow-up state.

mod contract;
mod documentation;
mod draft;
mod in_negotiation;
mod sent;
mod signatures;
mod terminal;

use serde_json::json;
use tracing::warn;

pub use contract::ContractDrafting;
pub use documentation::DocumentationPhase;
pub use draft::{DraftUpdate, ProposalDraft};
pub use in_negotiation::InNegotiation;
pub use sent::ProposalSent;
pub use signatures::AwaitingSignatures;
pub use terminal::{Cancelled, Rented, Sold};

use super::context::NegotiationContext;
use super::domain::{ActorId, Negotiation, NegotiationStatus};
use super::error::{DealError, ValidationError};
use super::repository::{NegotiationsRepository, PropertiesRepository};

/// A negotiation wrapped in the behavior of its current status.
pub enum NegotiationState {
    ProposalDraft(ProposalDraft),
    ProposalSent(ProposalSent),
    InNegotiation(InNegotiation),
    DocumentationPhase(DocumentationPhase),
    ContractDrafting(ContractDrafting),
    AwaitingSignatures(AwaitingSignatures),
    Sold(Sold),
    Rented(Rented),
    Cancelled(Cancelled),
}

impl NegotiationState {
    pub fn status(&self) -> NegotiationStatus {
        match self {
            Self::ProposalDraft(_) => NegotiationStatus::ProposalDraft,
            Self::ProposalSent(_) => NegotiationStatus::ProposalSent,
            Self::InNegotiation(_) => NegotiationStatus::InNegotiation,
            Self::DocumentationPhase(_) => NegotiationStatus::DocumentationPhase,
            Self::ContractDrafting(_) => NegotiationStatus::ContractDrafting,
            Self::AwaitingSignatures(_) => NegotiationStatus::AwaitingSignatures,
            Self::Sold(_) => NegotiationStatus::Sold,
            Self::Rented(_) => NegotiationStatus::Rented,
            Self::Cancelled(_) => NegotiationStatus::Cancelled,
        }
    }

    pub fn negotiation(&self) -> &Negotiation {
        match self {
            Self::ProposalDraft(state) => state.negotiation(),
            Self::ProposalSent(state) => state.negotiation(),
            Self::InNegotiation(state) => state.negotiation(),
            Self::DocumentationPhase(state) => state.negotiation(),
            Self::ContractDrafting(state) => state.negotiation(),
            Self::AwaitingSignatures(state) => state.negotiation(),
            Self::Sold(state) => state.negotiation(),
            Self::Rented(state) => state.negotiation(),
            Self::Cancelled(state) => state.negotiation(),
        }
    }

    pub fn update_draft(self, update: DraftUpdate) -> Result<NegotiationState, DealError> {
        match self {
            Self::ProposalDraft(state) => Ok(Self::ProposalDraft(state.update_draft(update)?)),
            other => Err(other.unsupported("update_draft")),
        }
    }

    pub fn send_proposal(
        self,
        actor_id: &ActorId,
        generate_pdf: bool,
    ) -> Result<NegotiationState, DealError> {
        match self {
            Self::ProposalDraft(state) => Ok(Self::ProposalSent(
                state.send_proposal(actor_id, generate_pdf)?,
            )),
            other => Err(other.unsupported("send_proposal")),
        }
    }

    pub fn approve_proposal(self, actor_id: &ActorId) -> Result<NegotiationState, DealError> {
        match self {
            Self::ProposalSent(state) => {
                Ok(Self::InNegotiation(state.approve_proposal(actor_id)?))
            }
            other => Err(other.unsupported("approve_proposal")),
        }
    }

    pub fn request_documentation(self, actor_id: &ActorId) -> Result<NegotiationState, DealError> {
        match self {
            Self::InNegotiation(state) => Ok(Self::DocumentationPhase(
                state.request_documentation(actor_id)?,
            )),
            other => Err(other.unsupported("request_documentation")),
        }
    }

    pub fn begin_contract_drafting(
        self,
        actor_id: &ActorId,
    ) -> Result<NegotiationState, DealError> {
        match self {
            Self::DocumentationPhase(state) => Ok(Self::ContractDrafting(
                state.begin_contract_drafting(actor_id)?,
            )),
            other => Err(other.unsupported("begin_contract_drafting")),
        }
    }

    pub fn upload_final_contract(
        self,
        actor_id: &ActorId,
        content: Vec<u8>,
    ) -> Result<NegotiationState, DealError> {
        match self {
            Self::ContractDrafting(state) => Ok(Self::AwaitingSignatures(
                state.upload_final_contract(actor_id, content)?,
            )),
            other => Err(other.unsupported("upload_final_contract")),
        }
    }

    pub fn mark_sold(self, actor_id: &ActorId) -> Result<NegotiationState, DealError> {
        match self {
            Self::AwaitingSignatures(state) => Ok(Self::Sold(state.mark_sold(actor_id)?)),
            other => Err(other.unsupported("mark_sold")),
        }
    }

    pub fn mark_rented(self, actor_id: &ActorId) -> Result<NegotiationState, DealError> {
        match self {
            Self::AwaitingSignatures(state) => Ok(Self::Rented(state.mark_rented(actor_id)?)),
            other => Err(other.unsupported("mark_rented")),
        }
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<NegotiationState, DealError> {
        match self {
            Self::ProposalDraft(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            Self::ProposalSent(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            Self::InNegotiation(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            Self::DocumentationPhase(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            Self::ContractDrafting(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            Self::AwaitingSignatures(state) => Ok(Self::Cancelled(state.cancel(actor_id)?)),
            other => Err(other.unsupported("cancel")),
        }
    }

    fn unsupported(&self, operation: &'static str) -> DealError {
        ValidationError::UnsupportedOperation {
            status: self.status(),
            operation,
        }
        .into()
    }
}

/// Builds the state object matching a negotiation's persisted status.
pub struct NegotiationStateFactory;

impl NegotiationStateFactory {
    pub fn state_for(
        negotiation: Negotiation,
        ctx: NegotiationContext,
    ) -> Result<NegotiationState, DealError> {
        let state = match negotiation.status {
            NegotiationStatus::ProposalDraft => {
                NegotiationState::ProposalDraft(ProposalDraft::new(negotiation, ctx))
            }
            NegotiationStatus::ProposalSent => {
                NegotiationState::ProposalSent(ProposalSent::new(negotiation, ctx))
            }
            NegotiationStatus::InNegotiation => {
                NegotiationState::InNegotiation(InNegotiation::new(negotiation, ctx))
            }
            NegotiationStatus::DocumentationPhase => {
                NegotiationState::DocumentationPhase(DocumentationPhase::new(negotiation, ctx))
            }
            NegotiationStatus::ContractDrafting => {
                NegotiationState::ContractDrafting(ContractDrafting::new(negotiation, ctx)?)
            }
            NegotiationStatus::AwaitingSignatures => {
                NegotiationState::AwaitingSignatures(AwaitingSignatures::new(negotiation, ctx))
            }
            NegotiationStatus::Sold => NegotiationState::Sold(Sold::new(negotiation)),
            NegotiationStatus::Rented => NegotiationState::Rented(Rented::new(negotiation)),
            NegotiationStatus::Cancelled => {
                NegotiationState::Cancelled(Cancelled::new(negotiation))
            }
        };
        Ok(state)
    }
}

/// Guard that the wrapped snapshot still carries the status this state was
/// built for. Reported as a conflict so stale callers retry with a fresh
/// read.
pub(crate) fn ensure_status(
    negotiation: &Negotiation,
    expected: NegotiationStatus,
) -> Result<(), DealError> {
    if negotiation.status != expected {
        return Err(DealError::Conflict {
            negotiation_id: negotiation.id.clone(),
            expected_status: expected,
            expected_version: negotiation.version,
        });
    }
    Ok(())
}

/// Shared cancellation path. Flips the negotiation to CANCELLED and restores
/// the property listing in the same transaction; a listing whose lifecycle
/// already reached SOLD or RENTED is left alone and only logged.
pub(crate) fn cancel_negotiation(
    negotiation: Negotiation,
    ctx: &NegotiationContext,
    actor_id: &ActorId,
) -> Result<Cancelled, DealError> {
    let cancelled = ctx.transactions.run(|tx| {
        let advanced = NegotiationsRepository::transition(
            tx,
            &negotiation,
            NegotiationStatus::Cancelled,
            actor_id,
            json!({ "operation": "cancel" }),
        )?;
        let restored = PropertiesRepository::restore_availability(tx, &advanced.property_id)?;
        if !restored {
            warn!(
                negotiation_id = %advanced.id,
                property_id = %advanced.property_id,
                "property not restored on cancel; lifecycle already closed"
            );
        }
        Ok(advanced)
    })?;
    Ok(Cancelled::new(cancelled))
}
