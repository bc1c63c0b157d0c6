use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use helseplattform::workflows::notifications::{
    notification_router, NotificationDispatcher, NotificationQueue, NotificationTransport,
};
use helseplattform::workflows::shifts::{
    shift_router, ShiftMarketplaceService, ShiftRepository, WorkerDirectory,
};
use serde_json::json;
use std::sync::Arc;

/// Marketplace and dispatch routes plus the operational endpoints.
pub(crate) fn with_marketplace_routes<R, W, Q, T>(
    service: Arc<ShiftMarketplaceService<R, W, Q>>,
    dispatcher: Arc<NotificationDispatcher<Q, T>>,
) -> axum::Router
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
    T: NotificationTransport + 'static,
{
    shift_router(service)
        .merge(notification_router(dispatcher))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
