use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::workflows::shifts::domain::{DepartmentId, WorkerId};

pub const SESSION_USER_HEADER: &str = "x-session-user";
pub const SESSION_ROLE_HEADER: &str = "x-session-role";

/// Which side of the marketplace the signed-in user acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Worker,
    Department,
}

impl SessionRole {
    pub const fn label(self) -> &'static str {
        match self {
            SessionRole::Worker => "worker",
            SessionRole::Department => "department",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "worker" => Some(Self::Worker),
            "department" => Some(Self::Department),
            _ => None,
        }
    }
}

/// Signed-in user passed explicitly to every handler that acts on their behalf.
///
/// The identity provider login happens upstream; the gateway forwards the resolved user
/// id and role as request headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub role: SessionRole,
}

impl SessionContext {
    pub fn worker(id: impl Into<String>) -> Self {
        Self {
            user_id: id.into(),
            role: SessionRole::Worker,
        }
    }

    pub fn department(id: impl Into<String>) -> Self {
        Self {
            user_id: id.into(),
            role: SessionRole::Department,
        }
    }

    pub fn worker_id(&self) -> Option<WorkerId> {
        (self.role == SessionRole::Worker).then(|| WorkerId(self.user_id.clone()))
    }

    pub fn department_id(&self) -> Option<DepartmentId> {
        (self.role == SessionRole::Department).then(|| DepartmentId(self.user_id.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionRejection {
    #[error("missing session header '{0}'")]
    MissingHeader(&'static str),
    #[error("unknown session role '{0}'")]
    UnknownRole(String),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, SESSION_USER_HEADER)?;
        let raw_role = header_value(parts, SESSION_ROLE_HEADER)?;
        let role = SessionRole::parse(&raw_role).ok_or(SessionRejection::UnknownRole(raw_role))?;

        Ok(Self { user_id, role })
    }
}

fn header_value(parts: &Parts, name: &'static str) -> Result<String, SessionRejection> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(SessionRejection::MissingHeader(name))
}
