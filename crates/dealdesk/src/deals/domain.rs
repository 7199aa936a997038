use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for negotiations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NegotiationId(pub String);

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for brokers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerId(pub String);

/// Identifier wrapper for buyer clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Identifier of the user driving an operation, recorded in history rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Identifier wrapper for negotiation documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Identifier wrapper for commission entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommissionId(pub String);

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CommissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle statuses a negotiation moves through between first proposal and
/// a closed or cancelled outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    ProposalDraft,
    ProposalSent,
    InNegotiation,
    DocumentationPhase,
    ContractDrafting,
    AwaitingSignatures,
    Sold,
    Rented,
    Cancelled,
}

impl NegotiationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            NegotiationStatus::ProposalDraft => "PROPOSAL_DRAFT",
            NegotiationStatus::ProposalSent => "PROPOSAL_SENT",
            NegotiationStatus::InNegotiation => "IN_NEGOTIATION",
            NegotiationStatus::DocumentationPhase => "DOCUMENTATION_PHASE",
            NegotiationStatus::ContractDrafting => "CONTRACT_DRAFTING",
            NegotiationStatus::AwaitingSignatures => "AWAITING_SIGNATURES",
            NegotiationStatus::Sold => "SOLD",
            NegotiationStatus::Rented => "RENTED",
            NegotiationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses accept no further operations.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            NegotiationStatus::Sold | NegotiationStatus::Rented | NegotiationStatus::Cancelled
        )
    }
}

/// How a buyer intends to fund part of the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    TradeIn,
    Financing,
    Other,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::TradeIn => "TRADE_IN",
            PaymentMethod::Financing => "FINANCING",
            PaymentMethod::Other => "OTHER",
        }
    }
}

/// One slice of the agreed payment mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentComponent {
    pub method: PaymentMethod,
    pub amount: Decimal,
}

/// Full payment arrangement for a proposal; frequently a single component but
/// composites (cash plus trade-in plus financing) are common.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub components: Vec<PaymentComponent>,
}

impl PaymentDetails {
    pub fn single(method: PaymentMethod, amount: Decimal) -> Self {
        Self {
            components: vec![PaymentComponent { method, amount }],
        }
    }

    pub fn total(&self) -> Decimal {
        self.components
            .iter()
            .map(|component| component.amount)
            .sum()
    }

    /// Summary of the payment mix used on rendered proposals.
    pub fn method_label(&self) -> String {
        let mut labels: Vec<&str> = self
            .components
            .iter()
            .map(|component| component.method.label())
            .collect();
        labels.dedup();
        if labels.is_empty() {
            "UNSPECIFIED".to_string()
        } else {
            labels.join(" + ")
        }
    }
}

/// A negotiation row: one brokered deal over one property.
///
/// `version` starts at 1 and increments on every successful mutation; all
/// writes are conditional on the version the caller last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negotiation {
    pub id: NegotiationId,
    pub property_id: PropertyId,
    pub capturing_broker_id: BrokerId,
    pub selling_broker_id: Option<BrokerId>,
    pub buyer_client_id: Option<ClientId>,
    pub status: NegotiationStatus,
    pub version: u64,
    pub payment_details: Option<PaymentDetails>,
    pub final_value: Option<Decimal>,
    pub proposal_validity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Marketability of a listing while negotiations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    UnderNegotiation,
}

/// Whether the property itself has been permanently moved off the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyLifecycle {
    Available,
    Sold,
    Rented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyVisibility {
    Public,
    Hidden,
}

/// The slice of a property listing the deal workflows read and mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub address: String,
    pub price: Decimal,
    pub status: PropertyStatus,
    pub lifecycle_status: PropertyLifecycle,
    pub visibility: PropertyVisibility,
}

impl PropertyRecord {
    /// A freshly listed property: on the market and publicly visible.
    pub fn available(id: PropertyId, address: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            address: address.into(),
            price,
            status: PropertyStatus::Available,
            lifecycle_status: PropertyLifecycle::Available,
            visibility: PropertyVisibility::Public,
        }
    }
}

/// Broker lookup row consumed by proposal rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerRecord {
    pub id: BrokerId,
    pub name: String,
}

/// Buyer lookup row consumed by proposal rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    pub name: String,
    pub cpf: String,
}

/// Append-only audit record written alongside every status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationHistoryRecord {
    pub id: u64,
    pub negotiation_id: NegotiationId,
    pub from_status: NegotiationStatus,
    pub to_status: NegotiationStatus,
    pub actor_id: ActorId,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Origin of a document row. Only supporting documents count toward the
/// documentation gate; rendered proposals and uploaded contracts are
/// system-generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Supporting,
    RenderedProposal,
    FinalContract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// A document attached to a negotiation, optionally carrying its bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationDocument {
    pub id: DocumentId,
    pub negotiation_id: NegotiationId,
    pub name: String,
    pub kind: DocumentKind,
    pub review_status: DocumentReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// Which side of the deal a commission entry pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionRole {
    Capturing,
    Selling,
}

impl CommissionRole {
    pub const fn label(self) -> &'static str {
        match self {
            CommissionRole::Capturing => "CAPTURING",
            CommissionRole::Selling => "SELLING",
        }
    }
}

/// Payout state of a commission entry. Transitions beyond `Pending` belong to
/// the payout process, not the deal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Voided,
}

/// A broker's earned share of a closed deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub negotiation_id: NegotiationId,
    pub broker_id: BrokerId,
    pub role: CommissionRole,
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}

/// Percentage table for commission settlement. The active rule is the most
/// recently created row still flagged active; the capturing, selling, and
/// total percentages are never reconciled against each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub capturing_percentage: Decimal,
    pub selling_percentage: Decimal,
    pub total_percentage: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
