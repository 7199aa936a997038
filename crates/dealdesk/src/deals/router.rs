use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{ActorId, BrokerId, ClientId, Negotiation, NegotiationId, PaymentDetails, PropertyId};
use super::error::DealError;
use super::service::{NegotiationService, OpenDraft};
use super::states::DraftUpdate;

/// HTTP surface for the negotiation lifecycle. One route per lifecycle
/// operation plus the read endpoints; every handler hops to a blocking
/// worker because the service takes a store lock and may call the renderer.
pub fn negotiation_router(service: Arc<NegotiationService>) -> Router {
    Router::new()
        .route("/api/v1/negotiations", post(open_draft))
        .route("/api/v1/negotiations/:negotiation_id", get(fetch_negotiation))
        .route("/api/v1/negotiations/:negotiation_id/draft", put(update_draft))
        .route("/api/v1/negotiations/:negotiation_id/send", post(send_proposal))
        .route(
            "/api/v1/negotiations/:negotiation_id/approve",
            post(approve_proposal),
        )
        .route(
            "/api/v1/negotiations/:negotiation_id/request-documents",
            post(request_documentation),
        )
        .route(
            "/api/v1/negotiations/:negotiation_id/contract-drafting",
            post(begin_contract_drafting),
        )
        .route(
            "/api/v1/negotiations/:negotiation_id/final-contract",
            post(upload_final_contract),
        )
        .route(
            "/api/v1/negotiations/:negotiation_id/mark-sold",
            post(mark_sold),
        )
        .route(
            "/api/v1/negotiations/:negotiation_id/mark-rented",
            post(mark_rented),
        )
        .route("/api/v1/negotiations/:negotiation_id/cancel", post(cancel))
        .route("/api/v1/negotiations/:negotiation_id/history", get(history))
        .route(
            "/api/v1/negotiations/:negotiation_id/commissions",
            get(commissions),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct OpenDraftRequest {
    property_id: String,
    capturing_broker_id: String,
    #[serde(default)]
    buyer_client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActorRequest {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
struct SendProposalRequest {
    actor_id: String,
    #[serde(default)]
    generate_pdf: bool,
}

#[derive(Debug, Deserialize)]
struct DraftUpdateRequest {
    payment: PaymentDetails,
    #[serde(default)]
    property_value: Option<Decimal>,
    validity_date: NaiveDate,
    #[serde(default)]
    selling_broker_id: Option<String>,
    #[serde(default)]
    self_as_selling_broker: bool,
}

/// Wire shape of a negotiation row.
#[derive(Debug, Serialize)]
struct NegotiationView {
    id: String,
    property_id: String,
    capturing_broker_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    selling_broker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer_client_id: Option<String>,
    status: &'static str,
    version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proposal_validity_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl From<Negotiation> for NegotiationView {
    fn from(negotiation: Negotiation) -> Self {
        Self {
            id: negotiation.id.0,
            property_id: negotiation.property_id.0,
            capturing_broker_id: negotiation.capturing_broker_id.0,
            selling_broker_id: negotiation.selling_broker_id.map(|id| id.0),
            buyer_client_id: negotiation.buyer_client_id.map(|id| id.0),
            status: negotiation.status.label(),
            version: negotiation.version,
            final_value: negotiation.final_value,
            proposal_validity_date: negotiation.proposal_validity_date,
            updated_at: negotiation.updated_at,
        }
    }
}

async fn open_draft(
    State(service): State<Arc<NegotiationService>>,
    Json(request): Json<OpenDraftRequest>,
) -> Response {
    dispatch_blocking(StatusCode::CREATED, move || {
        service
            .open_draft(OpenDraft {
                property_id: PropertyId(request.property_id),
                capturing_broker_id: BrokerId(request.capturing_broker_id),
                buyer_client_id: request.buyer_client_id.map(ClientId),
            })
            .map(NegotiationView::from)
    })
    .await
}

async fn fetch_negotiation(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .negotiation(&NegotiationId(negotiation_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn update_draft(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<DraftUpdateRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .update_draft(
                &NegotiationId(negotiation_id),
                DraftUpdate {
                    payment: request.payment,
                    property_value: request.property_value,
                    validity_date: request.validity_date,
                    selling_broker_id: request.selling_broker_id.map(BrokerId),
                    self_as_selling_broker: request.self_as_selling_broker,
                },
            )
            .map(NegotiationView::from)
    })
    .await
}

async fn send_proposal(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<SendProposalRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .send_proposal(
                &NegotiationId(negotiation_id),
                &ActorId(request.actor_id),
                request.generate_pdf,
            )
            .map(NegotiationView::from)
    })
    .await
}

async fn approve_proposal(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .approve_proposal(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn request_documentation(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .request_documentation(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn begin_contract_drafting(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .begin_contract_drafting(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

/// Raw request body is the contract blob; the actor rides in the query
/// string so the body stays untouched.
async fn upload_final_contract(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Query(request): Query<ActorRequest>,
    body: Bytes,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .upload_final_contract(
                &NegotiationId(negotiation_id),
                &ActorId(request.actor_id),
                body.to_vec(),
            )
            .map(NegotiationView::from)
    })
    .await
}

async fn mark_sold(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .mark_sold(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn mark_rented(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .mark_rented(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn cancel(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service
            .cancel(&NegotiationId(negotiation_id), &ActorId(request.actor_id))
            .map(NegotiationView::from)
    })
    .await
}

async fn history(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service.history(&NegotiationId(negotiation_id))
    })
    .await
}

async fn commissions(
    State(service): State<Arc<NegotiationService>>,
    Path(negotiation_id): Path<String>,
) -> Response {
    dispatch_blocking(StatusCode::OK, move || {
        service.commissions(&NegotiationId(negotiation_id))
    })
    .await
}

/// Run one service call on the blocking pool and translate the outcome.
async fn dispatch_blocking<T>(
    success: StatusCode,
    work: impl FnOnce() -> Result<T, DealError> + Send + 'static,
) -> Response
where
    T: Serialize + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => (success, Json(value)).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(join_error) => {
            error!(error = %join_error, "lifecycle worker aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "operation aborted" })),
            )
                .into_response()
        }
    }
}

impl IntoResponse for DealError {
    fn into_response(self) -> Response {
        let status = match &self {
            DealError::Validation(_) => StatusCode::BAD_REQUEST,
            DealError::Conflict { .. } => StatusCode::CONFLICT,
            DealError::NegotiationNotFound(_) | DealError::PropertyNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DealError::Pdf(_) => StatusCode::BAD_GATEWAY,
            DealError::CorruptState { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
