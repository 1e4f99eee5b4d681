//! Version history handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::ApiError;
use crate::handlers::{diagram_key, session_from};
use crate::schema::history::{ListVersionsResponse, SnapshotResponse, VersionSummary};
use crate::state::AppState;

/// Lists stored versions, newest first.
///
/// `GET /projects/{project}/diagrams/{kind}/history`
pub async fn list_versions(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<Json<ListVersionsResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let versions: Vec<VersionSummary> = state
        .sessions
        .history(&key.project, key.kind)
        .list()?
        .iter()
        .map(VersionSummary::from)
        .collect();
    Ok(Json(ListVersionsResponse {
        total: versions.len(),
        versions,
    }))
}

/// Stores a snapshot of the live graph.
///
/// `POST /projects/{project}/diagrams/{kind}/history`
pub async fn create_snapshot(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let editor = state.sessions.open(&key).await;
    let editor = editor.lock().await;
    let created = editor.snapshot_version()?;
    Ok(Json(SnapshotResponse {
        created: created.as_ref().map(VersionSummary::from),
    }))
}

/// Deletes one stored version.
///
/// `DELETE /projects/{project}/diagrams/{kind}/history/{id}`
pub async fn delete_version(
    State(state): State<AppState>,
    Path((project, kind, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<ListVersionsResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let history = state.sessions.history(&key.project, key.kind);
    history.delete(&id)?;
    state
        .sessions
        .notices(&key.project, &session_from(&headers))
        .success("Version deleted");
    let versions: Vec<VersionSummary> = history.list()?.iter().map(VersionSummary::from).collect();
    Ok(Json(ListVersionsResponse {
        total: versions.len(),
        versions,
    }))
}
