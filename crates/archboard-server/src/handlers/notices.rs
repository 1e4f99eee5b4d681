//! Notice feed handler.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use archboard_core::ProjectId;

use crate::handlers::session_from;
use crate::notice::{Audience, Notice};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub project: Option<String>,
}

/// Returns and clears the caller's notices, oldest first: those addressed to
/// the signed-in user plus, with `?project=`, those of that project's
/// editors.
///
/// `GET /notices`
pub async fn drain_notices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Json<Vec<Notice>> {
    let mut audiences = Vec::new();
    if let Some(user) = session_from(&headers).user {
        audiences.push(Audience::User(user));
    }
    if let Some(project) = query.project.filter(|p| !p.trim().is_empty()) {
        audiences.push(Audience::Project(ProjectId::from(project)));
    }
    Json(state.notices.drain_all(&audiences))
}
