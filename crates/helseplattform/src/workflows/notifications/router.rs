use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde_json::json;

use super::dispatcher::{NotificationDispatcher, NotificationTransport};
use super::queue::NotificationQueue;

/// Router exposing a manual trigger for one dispatch batch.
pub fn notification_router<Q, T>(dispatcher: Arc<NotificationDispatcher<Q, T>>) -> Router
where
    Q: NotificationQueue + 'static,
    T: NotificationTransport + 'static,
{
    Router::new()
        .route(
            "/api/v1/notifications/dispatch",
            post(dispatch_handler::<Q, T>),
        )
        .with_state(dispatcher)
}

pub(crate) async fn dispatch_handler<Q, T>(
    State(dispatcher): State<Arc<NotificationDispatcher<Q, T>>>,
) -> Response
where
    Q: NotificationQueue + 'static,
    T: NotificationTransport + 'static,
{
    match dispatcher.dispatch(Utc::now()) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
