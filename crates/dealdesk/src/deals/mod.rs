//! Deal lifecycle engine: a negotiation walks a fixed status graph from
//! drafted proposal to a sold, rented, or cancelled outcome. Transitions run
//! as transactions conditioned on the version the caller last saw, property
//! side effects commit with the transition that causes them, and closing a
//! deal settles broker commissions through the event bus.

pub mod commission;
pub mod context;
pub mod domain;
pub mod error;
pub mod events;
pub mod pdf;
pub mod repository;
pub mod router;
pub mod service;
pub mod states;
pub mod store;

#[cfg(test)]
mod tests;

pub use commission::{commission_breakdown, CommissionAllocation, CommissionService};
pub use context::NegotiationContext;
pub use domain::{
    ActorId, BrokerId, BrokerRecord, ClientId, ClientRecord, Commission, CommissionId,
    CommissionRole, CommissionRule, CommissionStatus, DocumentId, DocumentKind,
    DocumentReviewStatus, Negotiation, NegotiationDocument, NegotiationHistoryRecord,
    NegotiationId, NegotiationStatus, PaymentComponent, PaymentDetails, PaymentMethod,
    PropertyId, PropertyLifecycle, PropertyRecord, PropertyStatus, PropertyVisibility,
};
pub use error::{DealError, ValidationError};
pub use events::{DealClosedEvent, DealClosedSubscriber, NegotiationEventBus};
pub use pdf::{HttpProposalPdfService, PdfRenderError, ProposalPdfGateway, ProposalPdfRequest};
pub use router::negotiation_router;
pub use service::{NegotiationService, OpenDraft};
pub use states::{DraftUpdate, NegotiationState, NegotiationStateFactory};
pub use store::{DealStore, StoreTx, TransactionManager};
