use rust_decimal::Decimal;

use super::domain::{NegotiationId, NegotiationStatus, PropertyId};
use super::pdf::PdfRenderError;

/// Business-rule rejections. Callers fix their request; retrying the same
/// call cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("operation {operation} is not supported in status {}", .status.label())]
    UnsupportedOperation {
        status: NegotiationStatus,
        operation: &'static str,
    },
    #[error("a selling broker could not be resolved; name one or flag the capturing broker")]
    SellingBrokerUnresolved,
    #[error("provided property value {provided} does not match the listed price {expected}")]
    PropertyValueMismatch { expected: Decimal, provided: Decimal },
    #[error("proposal is missing its final value or validity date")]
    ProposalIncomplete,
    #[error("negotiation has no selling broker assigned")]
    SellingBrokerRequired,
    #[error("{pending_or_rejected} supporting document(s) still pending or rejected")]
    DocumentsAwaitingReview { pending_or_rejected: usize },
    #[error("at least one approved supporting document is required")]
    NoApprovedDocuments,
    #[error("negotiation closed without a final value")]
    FinalValueUnavailable,
    #[error("final value {value} must be positive")]
    FinalValueNotPositive { value: Decimal },
    #[error("no active commission rule is configured")]
    NoActiveCommissionRule,
    #[error("property {property_id} already has an active negotiation")]
    ActiveNegotiationExists { property_id: PropertyId },
}

/// Error raised by deal lifecycle operations.
///
/// `Conflict` is disjoint from validation so callers can tell retry-worthy
/// staleness apart from rule violations. Nothing here retries automatically.
#[derive(Debug, thiserror::Error)]
pub enum DealError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "negotiation {negotiation_id} changed concurrently (expected status {}, version {expected_version})",
        .expected_status.label()
    )]
    Conflict {
        negotiation_id: NegotiationId,
        expected_status: NegotiationStatus,
        expected_version: u64,
    },
    #[error("negotiation {0} not found")]
    NegotiationNotFound(NegotiationId),
    #[error("property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error("proposal rendering failed: {0}")]
    Pdf(#[from] PdfRenderError),
    #[error("negotiation {negotiation_id} is in a corrupt state: {reason}")]
    CorruptState {
        negotiation_id: NegotiationId,
        reason: String,
    },
}
