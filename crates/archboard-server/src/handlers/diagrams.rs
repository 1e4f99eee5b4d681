//! Diagram editing, saving, import and export handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;

use archboard_core::starters::find_starter;
use archboard_core::DiagramGraph;
use archboard_storage::DiagramKey;

use crate::editor::Editor;
use crate::error::ApiError;
use crate::handlers::{diagram_key, session_from};
use crate::scheduler::SaveOutcome;
use crate::schema::diagrams::{
    CloseResponse, Command, CommandResponse, DiagramView, RemovedCounts, SaveRequest,
    SaveResponse,
};
use crate::schema::templates::STARTER_PREFIX;
use crate::state::AppState;

/// Opens the diagram (loading it on first access) and returns its state.
///
/// `GET /projects/{project}/diagrams/{kind}`
pub async fn get_diagram(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<Json<DiagramView>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let editor = state.sessions.open(&key).await;
    let editor = editor.lock().await;
    Ok(Json(DiagramView::of(&editor)))
}

/// Applies one editor command.
///
/// `POST /projects/{project}/diagrams/{kind}`
pub async fn apply_command(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
    headers: HeaderMap,
    Json(command): Json<Command>,
) -> Result<Json<CommandResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;

    // Template graphs come from the store, so fetch them before locking the
    // editor.
    let template = match &command {
        Command::ApplyTemplate { id } => Some(resolve_template(&state, &key, &headers, id).await?),
        _ => None,
    };

    let editor = state.sessions.open(&key).await;
    let mut editor = editor.lock().await;
    let mut node_id = None;
    let mut edge_id = None;
    let mut removed = None;
    let mut save = None;

    match command {
        Command::AddNode { kind, position } => {
            node_id = Some(editor.add_node(kind, position)?);
        }
        Command::Connect {
            source,
            target,
            source_handle,
            target_handle,
        } => {
            edge_id = Some(editor.connect(&source, &target, source_handle, target_handle)?);
        }
        Command::EditNode { id, patch } => editor.edit_node(&id, patch)?,
        Command::MoveNode { id, position } => editor.move_node(&id, position)?,
        Command::LabelEdge { id, label } => editor.label_edge(&id, label)?,
        Command::Select { nodes, edges } => editor.select(nodes, edges)?,
        Command::ClearSelection => editor.clear_selection(),
        Command::DeleteSelection => {
            let items = editor.delete_selection()?;
            removed = Some(RemovedCounts {
                nodes: items.nodes.len(),
                edges: items.edges.len(),
            });
        }
        Command::Reset => save = Some(editor.reset().await?),
        Command::SetAutosave { enabled } => editor.set_autosave(enabled),
        Command::RestoreVersion { id } => editor.restore_version(&id)?,
        Command::ApplyTemplate { .. } => {
            if let Some((name, graph)) = template {
                editor.apply_template(&name, graph)?;
            }
        }
        Command::Reload => editor.reload().await,
    }

    Ok(Json(CommandResponse {
        node_id,
        edge_id,
        removed,
        save,
        view: DiagramView::of(&editor),
    }))
}

async fn resolve_template(
    state: &AppState,
    key: &DiagramKey,
    headers: &HeaderMap,
    id: &str,
) -> Result<(String, DiagramGraph), ApiError> {
    if let Some(slug) = id.strip_prefix(STARTER_PREFIX) {
        let starter = find_starter(slug)
            .filter(|s| s.kind == key.kind)
            .ok_or_else(|| ApiError::NotFound(format!("starter not found: {}", slug)))?;
        return Ok((starter.name.to_string(), starter.build()?));
    }
    let adapter = state
        .sessions
        .adapter(key.project.clone(), session_from(headers));
    let template = adapter
        .load_templates(key.kind)
        .await?
        .into_iter()
        .find(|t| t.id.0 == id)
        .ok_or_else(|| ApiError::NotFound(format!("template not found: {}", id)))?;
    Ok((template.name, template.graph))
}

/// Saves the diagram now, bypassing the auto-save delay.
///
/// `POST /projects/{project}/diagrams/{kind}/save`
pub async fn save_diagram(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let request: SaveRequest = if body.is_empty() {
        SaveRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(err.to_string()))?
    };
    let editor = state.sessions.open(&key).await;
    let mut editor = editor.lock().await;
    let outcome = editor.save_now(request.force).await?;
    match &outcome {
        SaveOutcome::Conflict { message } => return Err(ApiError::Conflict(message.clone())),
        SaveOutcome::Held => {
            return Err(ApiError::Conflict(
                "stored diagram could not be loaded; retry with force".to_string(),
            ))
        }
        SaveOutcome::Failed { message } => return Err(ApiError::InternalError(message.clone())),
        SaveOutcome::Saved { .. } | SaveOutcome::Unchanged => {}
    }
    Ok(Json(SaveResponse {
        saved: matches!(outcome, SaveOutcome::Saved { .. }),
        outcome,
        view: DiagramView::of(&editor),
    }))
}

/// Exports the diagram as a JSON document.
///
/// `GET /projects/{project}/diagrams/{kind}/export`
pub async fn export_json(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let key = diagram_key(project, &kind)?;
    let editor = state.sessions.open(&key).await;
    let editor = editor.lock().await;
    let document = editor.export_json();
    let filename = attachment_name(&editor, "json");
    Ok((
        [(header::CONTENT_DISPOSITION, filename)],
        Json(document),
    ))
}

/// Exports the diagram as a PNG image.
///
/// `GET /projects/{project}/diagrams/{kind}/export.png`
pub async fn export_png(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let key = diagram_key(project, &kind)?;
    let editor = state.sessions.open(&key).await;
    let editor = editor.lock().await;
    let bytes = editor.export_png()?;
    let filename = attachment_name(&editor, "png");
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        bytes,
    ))
}

fn attachment_name(editor: &Editor, extension: &str) -> String {
    format!(
        "attachment; filename=\"{}-diagram-{}.{}\"",
        editor.kind(),
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        extension
    )
}

/// Replaces the diagram with an uploaded JSON file.
///
/// `POST /projects/{project}/diagrams/{kind}/import`
pub async fn import_json(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<DiagramView>, ApiError> {
    let key = diagram_key(project, &kind)?;
    let editor = state.sessions.open(&key).await;
    let mut editor = editor.lock().await;
    editor.import_json(&body)?;
    Ok(Json(DiagramView::of(&editor)))
}

/// Closes the editor. Unsaved edits still waiting for auto-save are dropped.
///
/// `DELETE /projects/{project}/diagrams/{kind}/session`
pub async fn close_session(
    State(state): State<AppState>,
    Path((project, kind)): Path<(String, String)>,
) -> Result<Json<CloseResponse>, ApiError> {
    let key = diagram_key(project, &kind)?;
    Ok(Json(CloseResponse {
        closed: state.sessions.close(&key),
    }))
}
