//! Template handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use archboard_core::starters::starters_for;
use archboard_core::ProjectId;
use archboard_storage::{DiagramKey, TemplateId};

use crate::error::ApiError;
use crate::handlers::{parse_kind, session_from};
use crate::schema::templates::{
    DeleteTemplateResponse, ListTemplatesResponse, SaveTemplateRequest, TemplateSummary,
};
use crate::state::AppState;

/// Lists starters for the kind followed by the caller's templates. Anonymous
/// callers only see starters.
///
/// `GET /templates/{kind}`
pub async fn list_templates(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ListTemplatesResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let mut templates = starters_for(kind)
        .map(TemplateSummary::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let session = session_from(&headers);
    if session.user.is_some() {
        // Templates belong to users, not projects.
        let adapter = state.sessions.adapter(ProjectId::default(), session);
        templates.extend(adapter.load_templates(kind).await?.iter().map(TemplateSummary::from));
    }
    Ok(Json(ListTemplatesResponse { templates }))
}

/// Saves the current graph of a project's diagram as a template.
///
/// `POST /templates/{kind}`
pub async fn save_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<Json<TemplateSummary>, ApiError> {
    let kind = parse_kind(&kind)?;
    let key = DiagramKey::new(request.project_id.clone(), kind);
    let graph = {
        let editor = state.sessions.open(&key).await;
        let editor = editor.lock().await;
        editor.graph().clone()
    };
    let adapter = state
        .sessions
        .adapter(request.project_id, session_from(&headers));
    let template = adapter.save_template(&request.name, kind, &graph).await?;
    Ok(Json(TemplateSummary::from(&template)))
}

/// Deletes one of the caller's templates.
///
/// `DELETE /templates/id/{id}`
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteTemplateResponse>, ApiError> {
    let adapter = state
        .sessions
        .adapter(ProjectId::default(), session_from(&headers));
    adapter.delete_template(&TemplateId(id)).await?;
    Ok(Json(DeleteTemplateResponse { deleted: true }))
}
