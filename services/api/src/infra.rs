use chrono::Utc;
use dealdesk::config::{CommissionDefaults, PdfServiceConfig};
use dealdesk::deals::repository::CommissionRulesRepository;
use dealdesk::deals::{
    CommissionRule, CommissionService, DealError, DealStore, HttpProposalPdfService,
    NegotiationContext, NegotiationEventBus, NegotiationService, ProposalPdfGateway,
    TransactionManager,
};
use dealdesk::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Deal stack shared by the HTTP server and the CLI demo: one store, the
/// transaction manager over it, the event bus with commission settlement
/// subscribed, and the service facade.
pub(crate) struct DealPlatform {
    pub(crate) store: Arc<DealStore>,
    pub(crate) transactions: TransactionManager,
    pub(crate) context: NegotiationContext,
    pub(crate) service: Arc<NegotiationService>,
}

pub(crate) fn deal_platform(
    pdf: Option<Arc<dyn ProposalPdfGateway>>,
    defaults: &CommissionDefaults,
) -> Result<DealPlatform, AppError> {
    let store = Arc::new(DealStore::default());
    let transactions = TransactionManager::new(store.clone());
    let events = Arc::new(NegotiationEventBus::new());
    let context = NegotiationContext::new(transactions.clone(), events.clone(), pdf);
    let service = Arc::new(NegotiationService::new(context.clone()));
    events.subscribe(Arc::new(CommissionService::new(transactions.clone())));

    seed_commission_rule(&transactions, defaults)?;

    Ok(DealPlatform {
        store,
        transactions,
        context,
        service,
    })
}

/// Install the configured percentages as the active rule when none exists
/// yet, so closings settle out of the box.
fn seed_commission_rule(
    transactions: &TransactionManager,
    defaults: &CommissionDefaults,
) -> Result<(), AppError> {
    transactions.run(|tx| {
        if CommissionRulesRepository::active_rule(tx).is_none() {
            tx.insert_commission_rule(CommissionRule {
                capturing_percentage: defaults.capturing_percentage,
                selling_percentage: defaults.selling_percentage,
                total_percentage: defaults.total_percentage,
                is_active: true,
                created_at: Utc::now(),
            });
        }
        Ok(())
    })?;
    Ok(())
}

/// Build the proposal renderer client when a base URL is configured. Without
/// one, sends that ask for a rendered artifact are rejected.
pub(crate) fn proposal_pdf_gateway(
    config: &PdfServiceConfig,
) -> Result<Option<Arc<dyn ProposalPdfGateway>>, AppError> {
    match config.base_url.as_deref() {
        Some(base_url) => {
            let gateway = HttpProposalPdfService::new(base_url).map_err(DealError::from)?;
            Ok(Some(Arc::new(gateway)))
        }
        None => Ok(None),
    }
}
