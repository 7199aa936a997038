use std::sync::Arc;

use super::events::NegotiationEventBus;
use super::pdf::ProposalPdfGateway;
use super::store::TransactionManager;

/// Shared collaborators handed to every state object by the factory, so
/// states never reach into globals.
#[derive(Clone)]
pub struct NegotiationContext {
    pub transactions: TransactionManager,
    pub events: Arc<NegotiationEventBus>,
    pub pdf: Option<Arc<dyn ProposalPdfGateway>>,
}

impl NegotiationContext {
    pub fn new(
        transactions: TransactionManager,
        events: Arc<NegotiationEventBus>,
        pdf: Option<Arc<dyn ProposalPdfGateway>>,
    ) -> Self {
        Self {
            transactions,
            events,
            pdf,
        }
    }
}
