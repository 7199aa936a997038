use crate::cli::ServeArgs;
use crate::infra::{deal_platform, proposal_pdf_gateway, AppState};
use crate::routes::with_negotiation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dealdesk::config::AppConfig;
use dealdesk::error::AppError;
use dealdesk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pdf = proposal_pdf_gateway(&config.pdf)?;
    let platform = deal_platform(pdf, &config.commissions)?;

    let app = with_negotiation_routes(platform.service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
