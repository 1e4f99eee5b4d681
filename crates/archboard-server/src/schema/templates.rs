//! Template request/response types.

use archboard_core::starters::Starter;
use archboard_core::{CoreError, DiagramKind, ProjectId};
use archboard_storage::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of template ids that name a built-in starter.
pub const STARTER_PREFIX: &str = "starter:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    Starter,
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "diagramType")]
    pub kind: DiagramKind,
    pub source: TemplateSource,
    pub node_count: usize,
    pub edge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        TemplateSummary {
            id: template.id.to_string(),
            name: template.name.clone(),
            kind: template.kind,
            source: TemplateSource::User,
            node_count: template.node_count(),
            edge_count: template.edge_count(),
            created_at: Some(template.created_at),
        }
    }
}

impl TryFrom<&Starter> for TemplateSummary {
    type Error = CoreError;

    fn try_from(starter: &Starter) -> Result<Self, CoreError> {
        let graph = starter.build()?;
        Ok(TemplateSummary {
            id: format!("{}{}", STARTER_PREFIX, starter.slug),
            name: starter.name.to_string(),
            kind: starter.kind,
            source: TemplateSource::Starter,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            created_at: None,
        })
    }
}

/// Starters first, then the caller's templates newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ListTemplatesResponse {
    pub templates: Vec<TemplateSummary>,
}

/// Saves the current graph of a project's diagram as a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    pub project_id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteTemplateResponse {
    pub deleted: bool,
}
