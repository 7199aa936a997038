use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    BrokerId, BrokerRecord, ClientId, ClientRecord, Commission, CommissionId, CommissionRule,
    DocumentId, DocumentKind, DocumentReviewStatus, Negotiation, NegotiationDocument,
    NegotiationHistoryRecord, NegotiationId, PropertyId, PropertyRecord,
};
use super::error::DealError;

/// The tables backing the deal workflows.
///
/// Kept clonable so a transaction can snapshot the whole set cheaply enough
/// and restore it wholesale on rollback.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreInner {
    pub(crate) negotiations: HashMap<NegotiationId, Negotiation>,
    pub(crate) properties: HashMap<PropertyId, PropertyRecord>,
    pub(crate) brokers: HashMap<BrokerId, BrokerRecord>,
    pub(crate) clients: HashMap<ClientId, ClientRecord>,
    pub(crate) history: Vec<NegotiationHistoryRecord>,
    pub(crate) documents: Vec<NegotiationDocument>,
    pub(crate) commissions: Vec<Commission>,
    pub(crate) commission_rules: Vec<CommissionRule>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    negotiation: u64,
    document: u64,
    commission: u64,
    history: u64,
}

/// Transactional data store for negotiations, properties, and commissions.
///
/// One mutex serializes writers, standing in for row-level locking: the
/// first transaction to touch a negotiation wins, later ones observe the
/// committed result through their version checks.
#[derive(Debug, Default)]
pub struct DealStore {
    inner: Mutex<StoreInner>,
}

impl DealStore {
    /// Run a unit of work with commit-on-success, rollback-on-error
    /// semantics. The mutation set is visible to later readers only when the
    /// closure returns `Ok`.
    pub fn transaction<T>(
        &self,
        work: impl FnOnce(&mut StoreTx<'_>) -> Result<T, DealError>,
    ) -> Result<T, DealError> {
        let mut guard = self.lock();
        let snapshot = guard.clone();
        let mut tx = StoreTx {
            inner: &mut *guard,
        };
        match work(&mut tx) {
            Ok(value) => Ok(value),
            Err(error) => {
                *guard = snapshot;
                Err(error)
            }
        }
    }

    pub fn negotiation(&self, id: &NegotiationId) -> Option<Negotiation> {
        self.lock().negotiations.get(id).cloned()
    }

    pub fn property(&self, id: &PropertyId) -> Option<PropertyRecord> {
        self.lock().properties.get(id).cloned()
    }

    pub fn broker(&self, id: &BrokerId) -> Option<BrokerRecord> {
        self.lock().brokers.get(id).cloned()
    }

    pub fn client(&self, id: &ClientId) -> Option<ClientRecord> {
        self.lock().clients.get(id).cloned()
    }

    /// Audit rows for one negotiation, oldest first.
    pub fn history_for(&self, id: &NegotiationId) -> Vec<NegotiationHistoryRecord> {
        self.lock()
            .history
            .iter()
            .filter(|record| record.negotiation_id == *id)
            .cloned()
            .collect()
    }

    pub fn commissions_for(&self, id: &NegotiationId) -> Vec<Commission> {
        self.lock()
            .commissions
            .iter()
            .filter(|commission| commission.negotiation_id == *id)
            .cloned()
            .collect()
    }

    pub fn documents_for(&self, id: &NegotiationId) -> Vec<NegotiationDocument> {
        self.lock()
            .documents
            .iter()
            .filter(|document| document.negotiation_id == *id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

/// Handle on the open transaction. Repositories go through this for table
/// access; callers outside the crate use the seeding methods.
pub struct StoreTx<'a> {
    pub(crate) inner: &'a mut StoreInner,
}

impl StoreTx<'_> {
    /// Seed or replace a property listing.
    pub fn insert_property(&mut self, property: PropertyRecord) {
        self.inner.properties.insert(property.id.clone(), property);
    }

    /// Seed or replace a broker lookup row.
    pub fn insert_broker(&mut self, broker: BrokerRecord) {
        self.inner.brokers.insert(broker.id.clone(), broker);
    }

    /// Seed or replace a client lookup row.
    pub fn insert_client(&mut self, client: ClientRecord) {
        self.inner.clients.insert(client.id.clone(), client);
    }

    /// Append a commission rule row.
    pub fn insert_commission_rule(&mut self, rule: CommissionRule) {
        self.inner.commission_rules.push(rule);
    }

    /// Append a document row, allocating its identifier.
    pub fn insert_document(
        &mut self,
        negotiation_id: NegotiationId,
        name: impl Into<String>,
        kind: DocumentKind,
        review_status: DocumentReviewStatus,
        content: Option<Vec<u8>>,
    ) -> NegotiationDocument {
        let document = NegotiationDocument {
            id: self.next_document_id(),
            negotiation_id,
            name: name.into(),
            kind,
            review_status,
            content,
            created_at: Utc::now(),
        };
        self.inner.documents.push(document.clone());
        document
    }

    /// Flip a document's review status. Returns false when the id matches no
    /// row.
    pub fn set_document_review(
        &mut self,
        id: &DocumentId,
        review_status: DocumentReviewStatus,
    ) -> bool {
        match self
            .inner
            .documents
            .iter_mut()
            .find(|document| document.id == *id)
        {
            Some(document) => {
                document.review_status = review_status;
                true
            }
            None => false,
        }
    }

    pub(crate) fn next_negotiation_id(&mut self) -> NegotiationId {
        self.inner.sequences.negotiation += 1;
        NegotiationId(format!("neg-{:06}", self.inner.sequences.negotiation))
    }

    pub(crate) fn next_document_id(&mut self) -> DocumentId {
        self.inner.sequences.document += 1;
        DocumentId(format!("doc-{:06}", self.inner.sequences.document))
    }

    pub(crate) fn next_commission_id(&mut self) -> CommissionId {
        self.inner.sequences.commission += 1;
        CommissionId(format!("com-{:06}", self.inner.sequences.commission))
    }

    pub(crate) fn next_history_id(&mut self) -> u64 {
        self.inner.sequences.history += 1;
        self.inner.sequences.history
    }
}

/// The sole sanctioned entry point for transactions: hands each unit of work
/// to the store and surfaces the commit-or-rollback result.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    store: Arc<DealStore>,
}

impl TransactionManager {
    pub fn new(store: Arc<DealStore>) -> Self {
        Self { store }
    }

    pub fn run<T>(
        &self,
        work: impl FnOnce(&mut StoreTx<'_>) -> Result<T, DealError>,
    ) -> Result<T, DealError> {
        self.store.transaction(work)
    }

    /// Direct store access for non-transactional reads.
    pub fn store(&self) -> &Arc<DealStore> {
        &self.store
    }
}
