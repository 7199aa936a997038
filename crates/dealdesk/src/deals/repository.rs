use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::commission::CommissionAllocation;
use super::domain::{
    ActorId, BrokerId, ClientId, Commission, CommissionRule, CommissionStatus, DocumentKind,
    DocumentReviewStatus, Negotiation, NegotiationDocument, NegotiationHistoryRecord,
    NegotiationId, NegotiationStatus, PaymentDetails, PropertyId, PropertyLifecycle,
    PropertyRecord, PropertyStatus, PropertyVisibility,
};
use super::error::{DealError, ValidationError};
use super::store::StoreTx;

/// Row gateway for the negotiations table. Both write paths are single
/// conditional updates keyed on id, version, and status; zero matched rows
/// surfaces as a conflict and the caller's snapshot must be discarded.
pub struct NegotiationsRepository;

/// Fields a draft update writes.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftUpdateRow {
    pub selling_broker_id: BrokerId,
    pub payment_details: PaymentDetails,
    pub final_value: Decimal,
    pub proposal_validity_date: NaiveDate,
}

impl NegotiationsRepository {
    /// Insert a draft negotiation at version 1. At most one non-terminal
    /// negotiation may exist per property.
    pub fn create_draft(
        tx: &mut StoreTx<'_>,
        property_id: &PropertyId,
        capturing_broker_id: &BrokerId,
        buyer_client_id: Option<&ClientId>,
    ) -> Result<Negotiation, DealError> {
        if !tx.inner.properties.contains_key(property_id) {
            return Err(DealError::PropertyNotFound(property_id.clone()));
        }
        let active_exists = tx.inner.negotiations.values().any(|negotiation| {
            negotiation.property_id == *property_id && !negotiation.status.is_terminal()
        });
        if active_exists {
            return Err(ValidationError::ActiveNegotiationExists {
                property_id: property_id.clone(),
            }
            .into());
        }

        let now = Utc::now();
        let negotiation = Negotiation {
            id: tx.next_negotiation_id(),
            property_id: property_id.clone(),
            capturing_broker_id: capturing_broker_id.clone(),
            selling_broker_id: None,
            buyer_client_id: buyer_client_id.cloned(),
            status: NegotiationStatus::ProposalDraft,
            version: 1,
            payment_details: None,
            final_value: None,
            proposal_validity_date: None,
            created_at: now,
            updated_at: now,
        };
        tx.inner
            .negotiations
            .insert(negotiation.id.clone(), negotiation.clone());
        Ok(negotiation)
    }

    pub fn find(tx: &mut StoreTx<'_>, id: &NegotiationId) -> Result<Negotiation, DealError> {
        tx.inner
            .negotiations
            .get(id)
            .cloned()
            .ok_or_else(|| DealError::NegotiationNotFound(id.clone()))
    }

    /// Draft-phase field update: conditional on the expected version and the
    /// PROPOSAL_DRAFT status, bumps the version, records no history.
    pub fn update_draft(
        tx: &mut StoreTx<'_>,
        id: &NegotiationId,
        expected_version: u64,
        fields: DraftUpdateRow,
    ) -> Result<Negotiation, DealError> {
        let matched = tx.inner.negotiations.get_mut(id).filter(|row| {
            row.version == expected_version && row.status == NegotiationStatus::ProposalDraft
        });
        let Some(row) = matched else {
            return Err(DealError::Conflict {
                negotiation_id: id.clone(),
                expected_status: NegotiationStatus::ProposalDraft,
                expected_version,
            });
        };

        row.selling_broker_id = Some(fields.selling_broker_id);
        row.payment_details = Some(fields.payment_details);
        row.final_value = Some(fields.final_value);
        row.proposal_validity_date = Some(fields.proposal_validity_date);
        row.version += 1;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    /// Status transition: conditional on the caller's snapshot, advances the
    /// status, bumps the version, and appends exactly one audit record in the
    /// same transaction.
    pub fn transition(
        tx: &mut StoreTx<'_>,
        expected: &Negotiation,
        to_status: NegotiationStatus,
        actor_id: &ActorId,
        metadata: serde_json::Value,
    ) -> Result<Negotiation, DealError> {
        let matched = tx
            .inner
            .negotiations
            .get_mut(&expected.id)
            .filter(|row| row.version == expected.version && row.status == expected.status);
        let Some(row) = matched else {
            return Err(DealError::Conflict {
                negotiation_id: expected.id.clone(),
                expected_status: expected.status,
                expected_version: expected.version,
            });
        };

        let from_status = row.status;
        row.status = to_status;
        row.version += 1;
        row.updated_at = Utc::now();
        let advanced = row.clone();

        let history_id = tx.next_history_id();
        tx.inner.history.push(NegotiationHistoryRecord {
            id: history_id,
            negotiation_id: advanced.id.clone(),
            from_status,
            to_status,
            actor_id: actor_id.clone(),
            metadata,
            created_at: advanced.updated_at,
        });
        Ok(advanced)
    }
}

/// Row gateway for the property side effects of the lifecycle.
pub struct PropertiesRepository;

impl PropertiesRepository {
    pub fn find(tx: &mut StoreTx<'_>, id: &PropertyId) -> Result<PropertyRecord, DealError> {
        tx.inner
            .properties
            .get(id)
            .cloned()
            .ok_or_else(|| DealError::PropertyNotFound(id.clone()))
    }

    /// Take the listing off the public market while a deal is in flight.
    pub fn mark_under_negotiation(
        tx: &mut StoreTx<'_>,
        id: &PropertyId,
    ) -> Result<(), DealError> {
        let row = tx
            .inner
            .properties
            .get_mut(id)
            .ok_or_else(|| DealError::PropertyNotFound(id.clone()))?;
        row.status = PropertyStatus::UnderNegotiation;
        row.visibility = PropertyVisibility::Hidden;
        Ok(())
    }

    /// Record the permanent outcome of a closed deal on the listing.
    pub fn set_lifecycle(
        tx: &mut StoreTx<'_>,
        id: &PropertyId,
        lifecycle: PropertyLifecycle,
    ) -> Result<(), DealError> {
        let row = tx
            .inner
            .properties
            .get_mut(id)
            .ok_or_else(|| DealError::PropertyNotFound(id.clone()))?;
        row.lifecycle_status = lifecycle;
        Ok(())
    }

    /// Put the listing back on the market unless its lifecycle already
    /// reached SOLD or RENTED. Returns whether a row matched; a no-op is the
    /// caller's signal to log, never an error.
    pub fn restore_availability(tx: &mut StoreTx<'_>, id: &PropertyId) -> Result<bool, DealError> {
        let Some(row) = tx.inner.properties.get_mut(id) else {
            return Ok(false);
        };
        if matches!(
            row.lifecycle_status,
            PropertyLifecycle::Sold | PropertyLifecycle::Rented
        ) {
            return Ok(false);
        }
        row.status = PropertyStatus::Available;
        row.visibility = PropertyVisibility::Public;
        Ok(true)
    }
}

/// Row gateway for negotiation documents: gate counts over supporting
/// documents plus blob storage for generated artifacts.
pub struct NegotiationDocumentsRepository;

impl NegotiationDocumentsRepository {
    pub fn count_pending_or_rejected(tx: &mut StoreTx<'_>, id: &NegotiationId) -> usize {
        tx.inner
            .documents
            .iter()
            .filter(|document| {
                document.negotiation_id == *id
                    && document.kind == DocumentKind::Supporting
                    && matches!(
                        document.review_status,
                        DocumentReviewStatus::Pending | DocumentReviewStatus::Rejected
                    )
            })
            .count()
    }

    pub fn count_approved(tx: &mut StoreTx<'_>, id: &NegotiationId) -> usize {
        tx.inner
            .documents
            .iter()
            .filter(|document| {
                document.negotiation_id == *id
                    && document.kind == DocumentKind::Supporting
                    && document.review_status == DocumentReviewStatus::Approved
            })
            .count()
    }

    /// Persist a rendered proposal PDF. Stored approved but excluded from the
    /// documentation gate by kind.
    pub fn store_rendered_proposal(
        tx: &mut StoreTx<'_>,
        id: &NegotiationId,
        content: Vec<u8>,
    ) -> NegotiationDocument {
        tx.insert_document(
            id.clone(),
            format!("proposal-{}.pdf", id.0),
            DocumentKind::RenderedProposal,
            DocumentReviewStatus::Approved,
            Some(content),
        )
    }

    /// Persist the uploaded final contract.
    pub fn store_final_contract(
        tx: &mut StoreTx<'_>,
        id: &NegotiationId,
        content: Vec<u8>,
    ) -> NegotiationDocument {
        tx.insert_document(
            id.clone(),
            format!("contract-{}.pdf", id.0),
            DocumentKind::FinalContract,
            DocumentReviewStatus::Approved,
            Some(content),
        )
    }
}

/// Row gateway for the commission rule table.
pub struct CommissionRulesRepository;

impl CommissionRulesRepository {
    /// The rule in force: highest creation timestamp among active rows.
    pub fn active_rule(tx: &mut StoreTx<'_>) -> Option<CommissionRule> {
        tx.inner
            .commission_rules
            .iter()
            .filter(|rule| rule.is_active)
            .max_by_key(|rule| rule.created_at)
            .cloned()
    }
}

/// Row gateway for commission entries.
pub struct CommissionsRepository;

impl CommissionsRepository {
    /// Batched insert of settlement entries. An empty batch is skipped
    /// silently.
    pub fn insert_batch(
        tx: &mut StoreTx<'_>,
        negotiation_id: &NegotiationId,
        allocations: Vec<CommissionAllocation>,
    ) -> Vec<Commission> {
        if allocations.is_empty() {
            return Vec::new();
        }
        let created_at = Utc::now();
        allocations
            .into_iter()
            .map(|allocation| {
                let commission = Commission {
                    id: tx.next_commission_id(),
                    negotiation_id: negotiation_id.clone(),
                    broker_id: allocation.broker_id,
                    role: allocation.role,
                    amount: allocation.amount,
                    status: CommissionStatus::Pending,
                    created_at,
                };
                tx.inner.commissions.push(commission.clone());
                commission
            })
            .collect()
    }

    pub fn for_negotiation(tx: &mut StoreTx<'_>, id: &NegotiationId) -> Vec<Commission> {
        tx.inner
            .commissions
            .iter()
            .filter(|commission| commission.negotiation_id == *id)
            .cloned()
            .collect()
    }
}
