#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use dealdesk::deals::{
    ActorId, BrokerId, BrokerRecord, ClientId, ClientRecord, CommissionRule, CommissionService,
    DealStore, DocumentKind, DocumentReviewStatus, DraftUpdate, Negotiation, NegotiationContext,
    NegotiationEventBus, NegotiationId, NegotiationService, NegotiationStatus, OpenDraft,
    PaymentDetails, PaymentMethod, PdfRenderError, PropertyId, PropertyRecord,
    ProposalPdfGateway, ProposalPdfRequest, TransactionManager,
};

pub const PROPERTY: &str = "prop-001";
pub const CAPTURING_BROKER: &str = "broker-01";
pub const SELLING_BROKER: &str = "broker-02";
pub const BUYER: &str = "client-01";
pub const LISTING_PRICE: i64 = 200_000;

/// Everything a workflow test needs, wired the way the service binary wires
/// it: shared store, event bus, and commission settlement subscribed to deal
/// closures.
pub struct Harness {
    pub store: Arc<DealStore>,
    pub transactions: TransactionManager,
    pub events: Arc<NegotiationEventBus>,
    pub ctx: NegotiationContext,
    pub service: NegotiationService,
    pub commissions: Arc<CommissionService>,
}

pub fn harness() -> Harness {
    harness_with_pdf(None)
}

pub fn harness_with_pdf(pdf: Option<Arc<dyn ProposalPdfGateway>>) -> Harness {
    let store = Arc::new(DealStore::default());
    let transactions = TransactionManager::new(store.clone());
    let events = Arc::new(NegotiationEventBus::new());
    let ctx = NegotiationContext::new(transactions.clone(), events.clone(), pdf);
    let service = NegotiationService::new(ctx.clone());
    let commissions = Arc::new(CommissionService::new(transactions.clone()));
    events.subscribe(commissions.clone());
    Harness {
        store,
        transactions,
        events,
        ctx,
        service,
        commissions,
    }
}

pub fn seed_catalog(harness: &Harness) {
    harness
        .transactions
        .run(|tx| {
            tx.insert_property(PropertyRecord::available(
                PropertyId(PROPERTY.into()),
                "Av. Paulista 1500, apto 82",
                Decimal::from(LISTING_PRICE),
            ));
            tx.insert_broker(BrokerRecord {
                id: BrokerId(CAPTURING_BROKER.into()),
                name: "Marina Costa".into(),
            });
            tx.insert_broker(BrokerRecord {
                id: BrokerId(SELLING_BROKER.into()),
                name: "Rafael Lima".into(),
            });
            tx.insert_client(ClientRecord {
                id: ClientId(BUYER.into()),
                name: "Paulo Andrade".into(),
                cpf: "987.654.321-00".into(),
            });
            tx.insert_commission_rule(CommissionRule {
                capturing_percentage: Decimal::from(2),
                selling_percentage: Decimal::from(3),
                total_percentage: Decimal::from(5),
                is_active: true,
                created_at: Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(),
            });
            Ok(())
        })
        .unwrap();
}

pub fn manager() -> ActorId {
    ActorId("manager-01".into())
}

pub fn open(harness: &Harness) -> Negotiation {
    harness
        .service
        .open_draft(OpenDraft {
            property_id: PropertyId(PROPERTY.into()),
            capturing_broker_id: BrokerId(CAPTURING_BROKER.into()),
            buyer_client_id: Some(ClientId(BUYER.into())),
        })
        .unwrap()
}

pub fn standard_update() -> DraftUpdate {
    DraftUpdate {
        payment: PaymentDetails::single(PaymentMethod::Financing, Decimal::from(LISTING_PRICE)),
        property_value: Some(Decimal::from(LISTING_PRICE)),
        validity_date: Utc::now().date_naive() + Duration::days(10),
        selling_broker_id: Some(BrokerId(SELLING_BROKER.into())),
        self_as_selling_broker: false,
    }
}

pub fn attach_approved_document(harness: &Harness, id: &NegotiationId) {
    harness
        .transactions
        .run(|tx| {
            tx.insert_document(
                id.clone(),
                "certidao-negativa.pdf",
                DocumentKind::Supporting,
                DocumentReviewStatus::Approved,
                None,
            );
            Ok(())
        })
        .unwrap();
}

/// Run a deal from opening through contract upload, leaving it awaiting
/// signatures at version 7.
pub fn drive_to_awaiting_signatures(harness: &Harness) -> Negotiation {
    let opened = open(harness);
    let actor = manager();
    harness
        .service
        .update_draft(&opened.id, standard_update())
        .unwrap();
    harness
        .service
        .send_proposal(&opened.id, &actor, false)
        .unwrap();
    harness.service.approve_proposal(&opened.id, &actor).unwrap();
    harness
        .service
        .request_documentation(&opened.id, &actor)
        .unwrap();
    attach_approved_document(harness, &opened.id);
    harness
        .service
        .begin_contract_drafting(&opened.id, &actor)
        .unwrap();
    let awaiting = harness
        .service
        .upload_final_contract(&opened.id, &actor, b"%PDF-1.4 contrato final".to_vec())
        .unwrap();
    assert_eq!(awaiting.status, NegotiationStatus::AwaitingSignatures);
    awaiting
}

/// Renderer stand-in for flows that send the proposal with a PDF.
#[derive(Debug, Default)]
pub struct CapturingRenderer {
    requests: Mutex<Vec<ProposalPdfRequest>>,
}

impl CapturingRenderer {
    pub fn requests(&self) -> Vec<ProposalPdfRequest> {
        self.requests.lock().expect("renderer log poisoned").clone()
    }
}

impl ProposalPdfGateway for CapturingRenderer {
    fn render_proposal(&self, request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError> {
        self.requests
            .lock()
            .expect("renderer log poisoned")
            .push(request.clone());
        Ok(b"%PDF-1.4 proposta".to_vec())
    }
}
