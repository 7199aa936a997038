use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::runtime::Runtime;

/// Payload handed to the proposal renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalPdfRequest {
    pub client_name: Option<String>,
    pub client_cpf: Option<String>,
    pub property_address: String,
    pub capturing_broker_name: String,
    pub selling_broker_name: Option<String>,
    pub value: Decimal,
    pub payment_method: String,
    pub validity_date: NaiveDate,
    pub validity_days: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PdfRenderError {
    #[error("no proposal renderer is configured")]
    NotConfigured,
    #[error("pdf runtime error: {0}")]
    Runtime(String),
    #[error("pdf backend error: {0}")]
    Backend(String),
}

/// Boundary for proposal rendering. The production implementation calls an
/// external service; tests substitute a recording fake.
pub trait ProposalPdfGateway: fmt::Debug + Send + Sync {
    fn render_proposal(&self, request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError>;
}

/// HTTP client for the proposal rendering service. Blocks on a private
/// runtime so the lifecycle code stays synchronous.
pub struct HttpProposalPdfService {
    client: reqwest::Client,
    base_url: String,
    runtime: Runtime,
}

impl HttpProposalPdfService {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PdfRenderError> {
        let runtime = Runtime::new().map_err(|err| PdfRenderError::Runtime(err.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            runtime,
        })
    }

    fn map_error(err: reqwest::Error) -> PdfRenderError {
        PdfRenderError::Backend(err.to_string())
    }
}

impl ProposalPdfGateway for HttpProposalPdfService {
    fn render_proposal(&self, request: &ProposalPdfRequest) -> Result<Vec<u8>, PdfRenderError> {
        let url = format!(
            "{}/proposals/render",
            self.base_url.trim_end_matches('/')
        );
        let bytes = self.runtime.block_on(async {
            self.client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(Self::map_error)?
                .error_for_status()
                .map_err(Self::map_error)?
                .bytes()
                .await
                .map_err(Self::map_error)
        })?;
        Ok(bytes.to_vec())
    }
}

impl fmt::Debug for HttpProposalPdfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProposalPdfService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
