use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::deals::context::NegotiationContext;
use crate::deals::domain::{ActorId, BrokerId, Negotiation, NegotiationStatus, PaymentDetails};
use crate::deals::error::{DealError, ValidationError};
use crate::deals::pdf::{PdfRenderError, ProposalPdfRequest};
use crate::deals::repository::{
    DraftUpdateRow, NegotiationDocumentsRepository, NegotiationsRepository, PropertiesRepository,
};
use crate::deals::store::DealStore;

use super::{cancel_negotiation, ensure_status, Cancelled, ProposalSent};

/// Draft fields an agent may revise before the proposal goes out.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftUpdate {
    pub payment: PaymentDetails,
    /// Client-echoed property value. When present it must match the listing
    /// price on record; the persisted deal value always comes from the
    /// listing, never from this field.
    pub property_value: Option<Decimal>,
    pub validity_date: NaiveDate,
    pub selling_broker_id: Option<BrokerId>,
    /// Assign the capturing broker to the selling side when no explicit
    /// selling broker is given. An explicit id wins over this flag.
    pub self_as_selling_broker: bool,
}

/// PROPOSAL_DRAFT behavior: the only state whose fields may still change.
pub struct ProposalDraft {
    negotiation: Negotiation,
    ctx: NegotiationContext,
}

impl ProposalDraft {
    pub(crate) fn new(negotiation: Negotiation, ctx: NegotiationContext) -> Self {
        Self { negotiation, ctx }
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Revise the draft fields. Resolves the selling broker, checks the
    /// echoed property value against the listing, and pins the deal value to
    /// the listing price under the draft's version check.
    pub fn update_draft(self, update: DraftUpdate) -> Result<ProposalDraft, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ProposalDraft)?;
        let selling_broker_id = match (update.selling_broker_id, update.self_as_selling_broker) {
            (Some(explicit), _) => explicit,
            (None, true) => self.negotiation.capturing_broker_id.clone(),
            (None, false) => return Err(ValidationError::SellingBrokerUnresolved.into()),
        };

        let Self { negotiation, ctx } = self;
        let updated = ctx.transactions.run(|tx| {
            let property = PropertiesRepository::find(tx, &negotiation.property_id)?;
            if let Some(provided) = update.property_value {
                if provided != property.price {
                    return Err(ValidationError::PropertyValueMismatch {
                        expected: property.price,
                        provided,
                    }
                    .into());
                }
            }
            NegotiationsRepository::update_draft(
                tx,
                &negotiation.id,
                negotiation.version,
                DraftUpdateRow {
                    selling_broker_id,
                    payment_details: update.payment,
                    final_value: property.price,
                    proposal_validity_date: update.validity_date,
                },
            )
        })?;
        Ok(ProposalDraft::new(updated, ctx))
    }

    /// Send the proposal out. Rendering happens before the transition opens
    /// so a renderer failure leaves the draft untouched; the rendered
    /// artifact and the status change then commit together.
    pub fn send_proposal(
        self,
        actor_id: &ActorId,
        generate_pdf: bool,
    ) -> Result<ProposalSent, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ProposalDraft)?;
        let rendered = if generate_pdf {
            Some(self.render_proposal()?)
        } else {
            None
        };
        let metadata = json!({
            "operation": "send_proposal",
            "proposal_rendered": rendered.is_some(),
        });

        let Self { negotiation, ctx } = self;
        let sent = ctx.transactions.run(|tx| {
            let advanced = NegotiationsRepository::transition(
                tx,
                &negotiation,
                NegotiationStatus::ProposalSent,
                actor_id,
                metadata,
            )?;
            if let Some(content) = rendered {
                NegotiationDocumentsRepository::store_rendered_proposal(tx, &advanced.id, content);
            }
            Ok(advanced)
        })?;
        Ok(ProposalSent::new(sent, ctx))
    }

    pub fn cancel(self, actor_id: &ActorId) -> Result<Cancelled, DealError> {
        ensure_status(&self.negotiation, NegotiationStatus::ProposalDraft)?;
        cancel_negotiation(self.negotiation, &self.ctx, actor_id)
    }

    fn render_proposal(&self) -> Result<Vec<u8>, DealError> {
        let gateway = self.ctx.pdf.as_ref().ok_or(PdfRenderError::NotConfigured)?;
        let (Some(value), Some(validity_date)) = (
            self.negotiation.final_value,
            self.negotiation.proposal_validity_date,
        ) else {
            return Err(ValidationError::ProposalIncomplete.into());
        };

        let store = self.ctx.transactions.store();
        let property = store
            .property(&self.negotiation.property_id)
            .ok_or_else(|| DealError::PropertyNotFound(self.negotiation.property_id.clone()))?;
        let client = self
            .negotiation
            .buyer_client_id
            .as_ref()
            .and_then(|id| store.client(id));
        let payment_method = self
            .negotiation
            .payment_details
            .as_ref()
            .map(PaymentDetails::method_label)
            .unwrap_or_else(|| "UNSPECIFIED".to_string());

        let request = ProposalPdfRequest {
            client_name: client.as_ref().map(|client| client.name.clone()),
            client_cpf: client.map(|client| client.cpf),
            property_address: property.address,
            capturing_broker_name: broker_name(store, &self.negotiation.capturing_broker_id),
            selling_broker_name: self
                .negotiation
                .selling_broker_id
                .as_ref()
                .map(|id| broker_name(store, id)),
            value,
            payment_method,
            validity_date,
            validity_days: (validity_date - Utc::now().date_naive()).num_days(),
        };
        Ok(gateway.render_proposal(&request)?)
    }
}

/// Broker display name, falling back to the raw id when the lookup row is
/// missing.
fn broker_name(store: &DealStore, id: &BrokerId) -> String {
    store
        .broker(id)
        .map(|broker| broker.name)
        .unwrap_or_else(|| id.0.clone())
}
