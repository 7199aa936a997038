use super::context::NegotiationContext;
use super::domain::{
    ActorId, BrokerId, ClientId, Commission, Negotiation, NegotiationHistoryRecord, NegotiationId,
    PropertyId,
};
use super::error::DealError;
use super::repository::{CommissionsRepository, NegotiationsRepository};
use super::states::{DraftUpdate, NegotiationState, NegotiationStateFactory};

/// Request to open a draft negotiation.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDraft {
    pub property_id: PropertyId,
    pub capturing_broker_id: BrokerId,
    pub buyer_client_id: Option<ClientId>,
}

/// Facade over the lifecycle. Every mutating call loads a fresh snapshot,
/// wraps it in its state object, and forwards exactly one operation; the
/// version check underneath arbitrates racing callers.
#[derive(Clone)]
pub struct NegotiationService {
    ctx: NegotiationContext,
}

impl NegotiationService {
    pub fn new(ctx: NegotiationContext) -> Self {
        Self { ctx }
    }

    /// Open a PROPOSAL_DRAFT negotiation at version 1.
    pub fn open_draft(&self, request: OpenDraft) -> Result<Negotiation, DealError> {
        self.ctx.transactions.run(|tx| {
            NegotiationsRepository::create_draft(
                tx,
                &request.property_id,
                &request.capturing_broker_id,
                request.buyer_client_id.as_ref(),
            )
        })
    }

    pub fn negotiation(&self, id: &NegotiationId) -> Result<Negotiation, DealError> {
        self.ctx
            .transactions
            .store()
            .negotiation(id)
            .ok_or_else(|| DealError::NegotiationNotFound(id.clone()))
    }

    /// Audit trail for one negotiation, oldest first.
    pub fn history(&self, id: &NegotiationId) -> Result<Vec<NegotiationHistoryRecord>, DealError> {
        self.negotiation(id)?;
        Ok(self.ctx.transactions.store().history_for(id))
    }

    pub fn commissions(&self, id: &NegotiationId) -> Result<Vec<Commission>, DealError> {
        self.ctx.transactions.run(|tx| {
            NegotiationsRepository::find(tx, id)?;
            Ok(CommissionsRepository::for_negotiation(tx, id))
        })
    }

    pub fn update_draft(
        &self,
        id: &NegotiationId,
        update: DraftUpdate,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .update_draft(update)?
            .negotiation()
            .clone())
    }

    pub fn send_proposal(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
        generate_pdf: bool,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .send_proposal(actor_id, generate_pdf)?
            .negotiation()
            .clone())
    }

    pub fn approve_proposal(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .approve_proposal(actor_id)?
            .negotiation()
            .clone())
    }

    pub fn request_documentation(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .request_documentation(actor_id)?
            .negotiation()
            .clone())
    }

    pub fn begin_contract_drafting(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .begin_contract_drafting(actor_id)?
            .negotiation()
            .clone())
    }

    pub fn upload_final_contract(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
        content: Vec<u8>,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .upload_final_contract(actor_id, content)?
            .negotiation()
            .clone())
    }

    pub fn mark_sold(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
    ) -> Result<Negotiation, DealError> {
        Ok(self.state_for(id)?.mark_sold(actor_id)?.negotiation().clone())
    }

    pub fn mark_rented(
        &self,
        id: &NegotiationId,
        actor_id: &ActorId,
    ) -> Result<Negotiation, DealError> {
        Ok(self
            .state_for(id)?
            .mark_rented(actor_id)?
            .negotiation()
            .clone())
    }

    pub fn cancel(&self, id: &NegotiationId, actor_id: &ActorId) -> Result<Negotiation, DealError> {
        Ok(self.state_for(id)?.cancel(actor_id)?.negotiation().clone())
    }

    fn state_for(&self, id: &NegotiationId) -> Result<NegotiationState, DealError> {
        let negotiation = self.negotiation(id)?;
        NegotiationStateFactory::state_for(negotiation, self.ctx.clone())
    }
}
