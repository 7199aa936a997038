use crate::infra::deal_platform;
use chrono::{Duration, Utc};
use clap::Args;
use dealdesk::config::CommissionDefaults;
use dealdesk::deals::{
    ActorId, BrokerId, BrokerRecord, ClientId, ClientRecord, DealError, DocumentKind,
    DocumentReviewStatus, DraftUpdate, NegotiationStateFactory, OpenDraft, PaymentComponent,
    PaymentDetails, PaymentMethod, PdfRenderError, PropertyId, PropertyRecord, ProposalPdfGateway,
    ProposalPdfRequest,
};
use dealdesk::error::AppError;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Close the walkthrough as a rental instead of a sale.
    #[arg(long)]
    pub(crate) rented: bool,
    /// Put the capturing broker on both sides of the deal.
    #[arg(long)]
    pub(crate) self_deal: bool,
}

/// Stand-in renderer so the walkthrough works without a PDF service
/// deployed.
#[derive(Debug)]
struct DemoProposalRenderer;

impl ProposalPdfGateway for DemoProposalRenderer {
    fn render_proposal(&self, request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError> {
        let text = format!(
            "PROPOSAL | {} | {} | value {} | {} | valid until {}",
            request.client_name.as_deref().unwrap_or("unnamed buyer"),
            request.property_address,
            request.value,
            request.payment_method,
            request.validity_date
        );
        Ok(text.into_bytes())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { rented, self_deal } = args;

    let defaults = CommissionDefaults {
        capturing_percentage: Decimal::from(2),
        selling_percentage: Decimal::from(3),
        total_percentage: Decimal::from(5),
    };
    let platform = deal_platform(Some(Arc::new(DemoProposalRenderer)), &defaults)?;

    let property_id = PropertyId("prop-001".to_string());
    let capturing_broker = BrokerId("broker-01".to_string());
    let selling_broker = BrokerId("broker-02".to_string());
    let buyer = ClientId("client-01".to_string());
    let actor = ActorId("manager-01".to_string());

    platform.transactions.run(|tx| {
        tx.insert_property(PropertyRecord::available(
            property_id.clone(),
            "Av. Atlantica 700, apto 1203",
            Decimal::from(350_000),
        ));
        tx.insert_broker(BrokerRecord {
            id: capturing_broker.clone(),
            name: "Helena Martins".to_string(),
        });
        tx.insert_broker(BrokerRecord {
            id: selling_broker.clone(),
            name: "Diego Rocha".to_string(),
        });
        tx.insert_client(ClientRecord {
            id: buyer.clone(),
            name: "Sergio Franco".to_string(),
            cpf: "321.654.987-00".to_string(),
        });
        Ok(())
    })?;

    println!("Deal lifecycle walkthrough");
    println!(
        "Scenario: {} closing at Av. Atlantica 700, apto 1203 (listed at 350000){}",
        if rented { "rental" } else { "sale" },
        if self_deal {
            ", capturing broker on both sides"
        } else {
            ""
        }
    );

    println!("\nDraft");
    let opened = platform.service.open_draft(OpenDraft {
        property_id: property_id.clone(),
        capturing_broker_id: capturing_broker,
        buyer_client_id: Some(buyer),
    })?;
    println!(
        "- opened negotiation {} for Sergio Franco (status {}, version {})",
        opened.id,
        opened.status.label(),
        opened.version
    );

    let validity = Utc::now().date_naive() + Duration::days(15);
    let payment = PaymentDetails {
        components: vec![
            PaymentComponent {
                method: PaymentMethod::Financing,
                amount: Decimal::from(280_000),
            },
            PaymentComponent {
                method: PaymentMethod::Cash,
                amount: Decimal::from(70_000),
            },
        ],
    };
    println!(
        "- payment mix {} totalling {}",
        payment.method_label(),
        payment.total()
    );
    let drafted = platform.service.update_draft(
        &opened.id,
        DraftUpdate {
            payment,
            property_value: Some(Decimal::from(350_000)),
            validity_date: validity,
            selling_broker_id: if self_deal {
                None
            } else {
                Some(selling_broker)
            },
            self_as_selling_broker: self_deal,
        },
    )?;
    if let Some(value) = drafted.final_value {
        println!(
            "- pinned deal value {value} from the listing, valid until {validity} (version {})",
            drafted.version
        );
    }

    println!("\nProposal");
    let sent = platform.service.send_proposal(&opened.id, &actor, true)?;
    let rendered = platform
        .store
        .documents_for(&opened.id)
        .into_iter()
        .find(|document| document.kind == DocumentKind::RenderedProposal);
    match rendered {
        Some(document) => println!(
            "- rendered {} ({} bytes) and sent it to the buyer (version {})",
            document.name,
            document.content.as_ref().map(Vec::len).unwrap_or_default(),
            sent.version
        ),
        None => println!("- sent without a rendered artifact (version {})", sent.version),
    }

    let approved = platform.service.approve_proposal(&opened.id, &actor)?;
    if let Some(listing) = platform.store.property(&property_id) {
        println!(
            "- buyer accepted; listing now {:?}/{:?} (version {})",
            listing.status, listing.visibility, approved.version
        );
    }

    println!("\nDocumentation");
    let in_docs = platform.service.request_documentation(&opened.id, &actor)?;
    println!(
        "- requested the buyer dossier (version {})",
        in_docs.version
    );

    let dossier = platform.transactions.run(|tx| {
        Ok(tx.insert_document(
            opened.id.clone(),
            "matricula-atualizada.pdf",
            DocumentKind::Supporting,
            DocumentReviewStatus::Pending,
            None,
        ))
    })?;
    println!("- received {} (pending review)", dossier.name);

    match platform.service.begin_contract_drafting(&opened.id, &actor) {
        Err(err) => println!("- contract drafting held back: {err}"),
        Ok(_) => println!("- contract drafting opened unexpectedly"),
    }

    let reviewed = platform.transactions.run(|tx| {
        Ok(tx.set_document_review(&dossier.id, DocumentReviewStatus::Approved))
    })?;
    if reviewed {
        println!("- {} approved by the back office", dossier.name);
    }

    println!("\nContract");
    let drafting = platform
        .service
        .begin_contract_drafting(&opened.id, &actor)?;
    println!("- contract drafting opened (version {})", drafting.version);

    let awaiting = platform.service.upload_final_contract(
        &opened.id,
        &actor,
        b"final contract: Av. Atlantica 700, apto 1203".to_vec(),
    )?;
    println!(
        "- final contract uploaded; awaiting signatures (version {})",
        awaiting.version
    );

    println!("\nClosing");
    let stale = platform.service.negotiation(&opened.id)?;
    let closed = if rented {
        platform.service.mark_rented(&opened.id, &actor)?
    } else {
        platform.service.mark_sold(&opened.id, &actor)?
    };
    println!(
        "- closed as {} (version {})",
        closed.status.label(),
        closed.version
    );
    if let Some(listing) = platform.store.property(&property_id) {
        println!("- listing lifecycle now {:?}", listing.lifecycle_status);
    }

    let replay = NegotiationStateFactory::state_for(stale, platform.context.clone())?;
    match replay.mark_sold(&actor) {
        Err(DealError::Conflict {
            expected_status,
            expected_version,
            ..
        }) => println!(
            "- replay against version {expected_version} ({}) rejected: the deal moved on",
            expected_status.label()
        ),
        Err(err) => println!("- replay rejected: {err}"),
        Ok(_) => println!("- replay unexpectedly succeeded"),
    }

    println!("\nCommissions");
    let commissions = platform.store.commissions_for(&opened.id);
    if commissions.is_empty() {
        println!("- none settled");
    }
    for commission in &commissions {
        let broker = platform
            .store
            .broker(&commission.broker_id)
            .map(|record| record.name)
            .unwrap_or_else(|| commission.broker_id.to_string());
        println!(
            "- {} ({}) earns {}, payout {:?}",
            broker,
            commission.role.label(),
            commission.amount,
            commission.status
        );
    }

    println!("\nAudit trail");
    for record in platform.store.history_for(&opened.id) {
        let operation = record
            .metadata
            .get("operation")
            .and_then(|value| value.as_str())
            .unwrap_or("unknown");
        println!(
            "- {}: {} -> {} by {}",
            operation,
            record.from_status.label(),
            record.to_status.label(),
            record.actor_id
        );
    }

    Ok(())
}
