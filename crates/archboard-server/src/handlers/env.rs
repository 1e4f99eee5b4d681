//! Environment configuration handlers.

use axum::extract::{Path, State};
use axum::Json;

use archboard_storage::EnvVarId;

use crate::adapter::Session;
use crate::error::ApiError;
use crate::schema::env::{DeleteEnvResponse, ListEnvResponse, SaveEnvRequest};
use crate::state::AppState;

/// Lists a project's variables ordered by name.
///
/// `GET /projects/{project}/env`
pub async fn list_env(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<ListEnvResponse>, ApiError> {
    let adapter = state.sessions.adapter(project.into(), Session::anonymous());
    let variables = adapter.load_env_config().await?;
    Ok(Json(ListEnvResponse { variables }))
}

/// Inserts or updates one variable.
///
/// `POST /projects/{project}/env`
pub async fn save_env(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Json(request): Json<SaveEnvRequest>,
) -> Result<Json<archboard_storage::EnvVariable>, ApiError> {
    let adapter = state.sessions.adapter(project.into(), Session::anonymous());
    let variable = adapter
        .save_env_variable(request.id.as_ref(), request.draft)
        .await?;
    Ok(Json(variable))
}

/// Deletes one variable.
///
/// `DELETE /projects/{project}/env/{id}`
pub async fn delete_env(
    State(state): State<AppState>,
    Path((project, id)): Path<(String, String)>,
) -> Result<Json<DeleteEnvResponse>, ApiError> {
    let adapter = state.sessions.adapter(project.into(), Session::anonymous());
    adapter.delete_env_variable(&EnvVarId(id)).await?;
    Ok(Json(DeleteEnvResponse { deleted: true }))
}
