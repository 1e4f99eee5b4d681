//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the single error type returned by handlers. It implements
//! `axum::response::IntoResponse` and renders as
//! `{"success": false, "error": {"code": ..., "message": ...}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use archboard_core::{CoreError, UnknownDiagramKind};
use archboard_storage::StorageError;

use crate::adapter::AdapterError;
use crate::editor::EditorError;
use crate::export::ExportError;
use crate::history::HistoryError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 404
    #[error("not found: {0}")]
    NotFound(String),

    /// 400
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 401
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 409
    #[error("conflict: {0}")]
    Conflict(String),

    /// 503, the editor has not finished loading.
    #[error("not ready: {0}")]
    NotReady(String),

    /// 500
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::NotReady(msg) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY", msg),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, message, "request failed");
        }
        let body = serde_json::json!({
            "success": false,
            "error": ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::NodeNotFound { .. } | CoreError::EdgeNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::DuplicateNodeId { .. } | CoreError::DuplicateEdgeId { .. } => {
                ApiError::Conflict(err.to_string())
            }
            CoreError::DanglingEdge { .. } | CoreError::FieldsOnNonTable { .. } => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<UnknownDiagramKind> for ApiError {
    fn from(err: UnknownDiagramKind) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        AdapterError::from(err).into()
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NoUser => ApiError::Unauthorized(err.to_string()),
            AdapterError::Validation(msg) => ApiError::BadRequest(msg),
            AdapterError::Conflict(msg) => ApiError::Conflict(msg),
            AdapterError::NotFound(msg) => ApiError::NotFound(msg),
            AdapterError::Store(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            HistoryError::Corrupt(_) => ApiError::Conflict(err.to_string()),
            HistoryError::Storage(inner) => inner.into(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::TooLarge { .. } => ApiError::BadRequest(err.to_string()),
            ExportError::Encode(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::NotReady => ApiError::NotReady(err.to_string()),
            EditorError::Graph(inner) => inner.into(),
            EditorError::Import(inner) => ApiError::BadRequest(inner.to_string()),
            EditorError::History(inner) => inner.into(),
            EditorError::Export(inner) => inner.into(),
        }
    }
}
