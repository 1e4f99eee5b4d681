//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: they resolve the diagram key and caller, lock the
//! editor they need, call one editor or adapter operation and wrap the result
//! in a schema type.

pub mod diagrams;
pub mod env;
pub mod history;
pub mod notices;
pub mod palette;
pub mod templates;

use axum::http::HeaderMap;

use archboard_core::DiagramKind;
use archboard_storage::DiagramKey;

use crate::adapter::Session;
use crate::error::ApiError;

/// Header carrying the caller's user id.
pub const USER_HEADER: &str = "x-user-id";

pub(crate) fn parse_kind(kind: &str) -> Result<DiagramKind, ApiError> {
    Ok(kind.parse()?)
}

pub(crate) fn diagram_key(project: String, kind: &str) -> Result<DiagramKey, ApiError> {
    if project.trim().is_empty() {
        return Err(ApiError::BadRequest("project id is required".to_string()));
    }
    Ok(DiagramKey::new(project, parse_kind(kind)?))
}

/// The caller identified by [`USER_HEADER`], if any.
pub(crate) fn session_from(headers: &HeaderMap) -> Session {
    match headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
    {
        Some(user) if !user.is_empty() => Session::user(user),
        _ => Session::anonymous(),
    }
}
