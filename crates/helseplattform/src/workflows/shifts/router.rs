use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, AvailabilityPosting, DepartmentId, DepartmentRegistration, ShiftDraft,
    ShiftFilter, ShiftId, ShiftStatus, WorkerId, WorkerRegistration,
};
use super::repository::{RepositoryError, ShiftRepository, WorkerDirectory};
use super::service::{MarketplaceError, ShiftMarketplaceService};
use crate::identity::{SessionContext, SessionRole};
use crate::workflows::notifications::{ChannelSelection, NotificationQueue};

type SharedService<R, W, Q> = Arc<ShiftMarketplaceService<R, W, Q>>;

/// Router builder exposing the shift marketplace endpoints.
pub fn shift_router<R, W, Q>(service: Arc<ShiftMarketplaceService<R, W, Q>>) -> Router
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    Router::new()
        .route("/api/v1/matches", post(match_handler::<R, W, Q>))
        .route(
            "/api/v1/shifts",
            post(create_shift_handler::<R, W, Q>).get(open_shifts_handler::<R, W, Q>),
        )
        .route("/api/v1/shifts/:shift_id", get(shift_handler::<R, W, Q>))
        .route(
            "/api/v1/shifts/:shift_id/status",
            post(shift_status_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/shifts/:shift_id/notifications",
            post(notify_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/shifts/:shift_id/applications",
            post(apply_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/departments/:department_id/shifts",
            get(department_shifts_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/departments/:department_id/shifts/upcoming",
            get(upcoming_shifts_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/departments/:department_id/shifts/completed",
            get(completed_shifts_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/departments/:department_id/applications",
            get(pending_applications_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/workers/:worker_id/applications",
            get(worker_applications_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/workers/availability",
            post(availability_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/registrations/workers",
            post(register_worker_handler::<R, W, Q>),
        )
        .route(
            "/api/v1/registrations/departments",
            post(register_department_handler::<R, W, Q>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub profession: String,
    #[serde(default)]
    pub hourly_wage: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ShiftStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    /// Channel choices keyed by worker id; unlisted workers get every channel.
    #[serde(default)]
    pub overrides: BTreeMap<String, ChannelSelection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub message: String,
}

pub(crate) async fn match_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    axum::Json(request): axum::Json<MatchRequest>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    let profession = request.profession.trim();
    if profession.is_empty() {
        let payload = json!({ "error": "profession is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let offered_wage = request.hourly_wage.unwrap_or(0);
    match service.eligible_workers(profession, offered_wage) {
        Ok(candidates) => {
            let payload = json!({
                "profession": profession,
                "offered_wage": offered_wage,
                "candidates": candidates,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_shift_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    session: SessionContext,
    axum::Json(draft): axum::Json<ShiftDraft>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.create_shift(&session, draft) {
        Ok(shift) => (StatusCode::CREATED, axum::Json(shift)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn open_shifts_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Query(filter): Query<ShiftFilter>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.open_shifts(&filter, Utc::now()) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn shift_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(shift_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.get_shift(&ShiftId(shift_id)) {
        Ok(shift) => (StatusCode::OK, axum::Json(shift)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn shift_status_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(shift_id): Path<String>,
    session: SessionContext,
    axum::Json(update): axum::Json<StatusUpdate>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    if let Err(err) = require_department(&session) {
        return error_response(err);
    }
    match service.update_shift_status(&ShiftId(shift_id), update.status) {
        Ok(shift) => (StatusCode::OK, axum::Json(shift)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn notify_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(shift_id): Path<String>,
    session: SessionContext,
    axum::Json(request): axum::Json<NotifyRequest>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    if let Err(err) = require_department(&session) {
        return error_response(err);
    }
    let overrides: BTreeMap<WorkerId, ChannelSelection> = request
        .overrides
        .into_iter()
        .map(|(worker, selection)| (WorkerId(worker), selection))
        .collect();

    match service.notify_eligible_workers(&ShiftId(shift_id), &overrides, Utc::now()) {
        Ok(batch) => (StatusCode::ACCEPTED, axum::Json(batch)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn apply_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(shift_id): Path<String>,
    session: SessionContext,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.apply(&session, &ShiftId(shift_id), request.message, Utc::now()) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(application_id): Path<String>,
    session: SessionContext,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    if let Err(err) = require_department(&session) {
        return error_response(err);
    }
    match service.approve_application(&ApplicationId(application_id), Utc::now()) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(application_id): Path<String>,
    session: SessionContext,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    if let Err(err) = require_department(&session) {
        return error_response(err);
    }
    match service.reject_application(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn department_shifts_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(department_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.department_shifts(&DepartmentId(department_id)) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upcoming_shifts_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(department_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.upcoming_shifts(&DepartmentId(department_id), Utc::now()) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn completed_shifts_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(department_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.completed_shifts(&DepartmentId(department_id)) {
        Ok(shifts) => (StatusCode::OK, axum::Json(shifts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_applications_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(department_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.pending_applications(&DepartmentId(department_id)) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn worker_applications_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    Path(worker_id): Path<String>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.worker_applications(&WorkerId(worker_id)) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn availability_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    session: SessionContext,
    axum::Json(posting): axum::Json<AvailabilityPosting>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.post_availability(&session, posting) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn register_worker_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    axum::Json(registration): axum::Json<WorkerRegistration>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.register_worker(registration) {
        Ok(worker) => (StatusCode::CREATED, axum::Json(worker)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn register_department_handler<R, W, Q>(
    State(service): State<SharedService<R, W, Q>>,
    axum::Json(registration): axum::Json<DepartmentRegistration>,
) -> Response
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    match service.register_department(registration) {
        Ok(department) => (StatusCode::CREATED, axum::Json(department)).into_response(),
        Err(err) => error_response(err),
    }
}

fn require_department(session: &SessionContext) -> Result<(), MarketplaceError> {
    match session.role {
        SessionRole::Department => Ok(()),
        SessionRole::Worker => Err(MarketplaceError::Forbidden {
            required: SessionRole::Department,
        }),
    }
}

fn error_response(err: MarketplaceError) -> Response {
    let status = match &err {
        MarketplaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MarketplaceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        MarketplaceError::Repository(RepositoryError::Conflict)
        | MarketplaceError::ShiftNotOpen { .. }
        | MarketplaceError::ApplicationNotPending { .. } => StatusCode::CONFLICT,
        MarketplaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        MarketplaceError::Repository(RepositoryError::Unavailable(_))
        | MarketplaceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
