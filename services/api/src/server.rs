use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingTransport, Marketplace};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use helseplattform::config::AppConfig;
use helseplattform::error::AppError;
use helseplattform::telemetry;
use helseplattform::workflows::notifications::NotificationDispatcher;
use helseplattform::workflows::shifts::ShiftMarketplaceService;
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

    let marketplace = Marketplace::seeded();
    let service = Arc::new(ShiftMarketplaceService::new(
        marketplace.repository.clone(),
        marketplace.workers.clone(),
        marketplace.queue.clone(),
        config.matching.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        marketplace.queue.clone(),
        Arc::new(LoggingTransport::default()),
        config.notifications.clone(),
    ));

    let app = with_marketplace_routes(service, dispatcher)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        candidate_limit = config.matching.candidate_limit,
        top_match_threshold = config.matching.top_match_threshold,
        "shift marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
