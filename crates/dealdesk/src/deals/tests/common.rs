use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::deals::commission::CommissionService;
use crate::deals::context::NegotiationContext;
use crate::deals::domain::{
    ActorId, BrokerId, BrokerRecord, ClientId, ClientRecord, CommissionRule, DocumentId,
    DocumentKind, DocumentReviewStatus, Negotiation, NegotiationId, NegotiationStatus,
    PaymentDetails, PaymentMethod, PropertyId, PropertyRecord,
};
use crate::deals::events::{DealClosedEvent, DealClosedSubscriber, NegotiationEventBus};
use crate::deals::pdf::{PdfRenderError, ProposalPdfGateway, ProposalPdfRequest};
use crate::deals::service::{NegotiationService, OpenDraft};
use crate::deals::states::DraftUpdate;
use crate::deals::store::{DealStore, TransactionManager};

pub const PROPERTY: &str = "prop-100";
pub const CAPTURING_BROKER: &str = "broker-10";
pub const SELLING_BROKER: &str = "broker-20";
pub const BUYER: &str = "client-77";

/// Fully wired engine against a fresh store, commission settlement
/// subscribed.
pub struct TestRig {
    pub store: Arc<DealStore>,
    pub transactions: TransactionManager,
    pub events: Arc<NegotiationEventBus>,
    pub ctx: NegotiationContext,
    pub service: Arc<NegotiationService>,
    pub commissions: Arc<CommissionService>,
}

pub fn rig() -> TestRig {
    rig_with_pdf(None)
}

pub fn rig_with_pdf(pdf: Option<Arc<dyn ProposalPdfGateway>>) -> TestRig {
    let store = Arc::new(DealStore::default());
    let transactions = TransactionManager::new(store.clone());
    let events = Arc::new(NegotiationEventBus::new());
    let ctx = NegotiationContext::new(transactions.clone(), events.clone(), pdf);
    let service = Arc::new(NegotiationService::new(ctx.clone()));
    let commissions = Arc::new(CommissionService::new(transactions.clone()));
    events.subscribe(commissions.clone());
    TestRig {
        store,
        transactions,
        events,
        ctx,
        service,
        commissions,
    }
}

pub fn seed_market(rig: &TestRig) {
    seed_market_without_commission_rule(rig);
    rig.transactions
        .run(|tx| {
            tx.insert_commission_rule(default_rule());
            Ok(())
        })
        .unwrap();
}

pub fn seed_market_without_commission_rule(rig: &TestRig) {
    rig.transactions
        .run(|tx| {
            tx.insert_property(PropertyRecord::available(
                PropertyId(PROPERTY.into()),
                "Rua das Laranjeiras 52",
                Decimal::from(200_000),
            ));
            tx.insert_broker(BrokerRecord {
                id: BrokerId(CAPTURING_BROKER.into()),
                name: "Alice Prado".into(),
            });
            tx.insert_broker(BrokerRecord {
                id: BrokerId(SELLING_BROKER.into()),
                name: "Bruno Sa".into(),
            });
            tx.insert_client(ClientRecord {
                id: ClientId(BUYER.into()),
                name: "Carla Nunes".into(),
                cpf: "123.456.789-09".into(),
            });
            Ok(())
        })
        .unwrap();
}

pub fn default_rule() -> CommissionRule {
    CommissionRule {
        capturing_percentage: Decimal::from(2),
        selling_percentage: Decimal::from(3),
        total_percentage: Decimal::from(5),
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(),
    }
}

pub fn actor() -> ActorId {
    ActorId("mgr-001".into())
}

/// Complete draft revision pointing at the seeded selling broker.
pub fn draft_update() -> DraftUpdate {
    DraftUpdate {
        payment: PaymentDetails::single(PaymentMethod::Financing, Decimal::from(200_000)),
        property_value: None,
        validity_date: Utc::now().date_naive() + Duration::days(15),
        selling_broker_id: Some(BrokerId(SELLING_BROKER.into())),
        self_as_selling_broker: false,
    }
}

pub fn open_deal(rig: &TestRig) -> Negotiation {
    rig.service
        .open_draft(OpenDraft {
            property_id: PropertyId(PROPERTY.into()),
            capturing_broker_id: BrokerId(CAPTURING_BROKER.into()),
            buyer_client_id: Some(ClientId(BUYER.into())),
        })
        .unwrap()
}

/// Drive a fresh deal forward until it carries the requested status.
/// Supports every status reachable without closing or cancelling.
pub fn deal_at(rig: &TestRig, target: NegotiationStatus) -> Negotiation {
    let opened = open_deal(rig);
    if target == NegotiationStatus::ProposalDraft {
        return opened;
    }
    let id = opened.id;
    let actor = actor();
    rig.service.update_draft(&id, draft_update()).unwrap();
    let sent = rig.service.send_proposal(&id, &actor, false).unwrap();
    if target == NegotiationStatus::ProposalSent {
        return sent;
    }
    let negotiating = rig.service.approve_proposal(&id, &actor).unwrap();
    if target == NegotiationStatus::InNegotiation {
        return negotiating;
    }
    let documenting = rig.service.request_documentation(&id, &actor).unwrap();
    if target == NegotiationStatus::DocumentationPhase {
        return documenting;
    }
    supporting_document(rig, &id, DocumentReviewStatus::Approved);
    let drafting = rig.service.begin_contract_drafting(&id, &actor).unwrap();
    if target == NegotiationStatus::ContractDrafting {
        return drafting;
    }
    let awaiting = rig
        .service
        .upload_final_contract(&id, &actor, b"signed contract".to_vec())
        .unwrap();
    if target == NegotiationStatus::AwaitingSignatures {
        return awaiting;
    }
    panic!("deal_at cannot build status {target:?}");
}

pub fn supporting_document(
    rig: &TestRig,
    id: &NegotiationId,
    review_status: DocumentReviewStatus,
) -> DocumentId {
    rig.transactions
        .run(|tx| {
            let document = tx.insert_document(
                id.clone(),
                "matricula.pdf",
                DocumentKind::Supporting,
                review_status,
                None,
            );
            Ok(document.id)
        })
        .unwrap()
}

/// Renderer fake that logs every request and hands back a fixed blob.
#[derive(Debug, Default)]
pub struct RecordingPdfGateway {
    requests: Mutex<Vec<ProposalPdfRequest>>,
}

impl RecordingPdfGateway {
    pub fn requests(&self) -> Vec<ProposalPdfRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

impl ProposalPdfGateway for RecordingPdfGateway {
    fn render_proposal(&self, request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());
        Ok(b"%PDF-1.4 proposal".to_vec())
    }
}

/// Renderer fake that always fails.
#[derive(Debug, Default)]
pub struct FailingPdfGateway;

impl ProposalPdfGateway for FailingPdfGateway {
    fn render_proposal(&self, _request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError> {
        Err(PdfRenderError::Backend("renderer offline".to_string()))
    }
}

/// Subscriber fake that records the events it receives.
#[derive(Debug, Default)]
pub struct CountingSubscriber {
    seen: Mutex<Vec<DealClosedEvent>>,
}

impl CountingSubscriber {
    pub fn events(&self) -> Vec<DealClosedEvent> {
        self.seen.lock().expect("event log poisoned").clone()
    }
}

impl DealClosedSubscriber for CountingSubscriber {
    fn on_deal_closed(&self, event: &DealClosedEvent) {
        self.seen
            .lock()
            .expect("event log poisoned")
            .push(event.clone());
    }
}
