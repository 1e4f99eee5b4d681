//! Storage-layer keys and records.
//!
//! Diagrams are keyed by `(project, kind)`; templates belong to a user;
//! environment variables belong to a project.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archboard_core::{DiagramGraph, DiagramKind, ProjectId};

use crate::error::StorageError;

/// Composite key of a live diagram. At most one row exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagramKey {
    pub project: ProjectId,
    pub kind: DiagramKind,
}

impl DiagramKey {
    pub fn new(project: impl Into<ProjectId>, kind: DiagramKind) -> Self {
        DiagramKey {
            project: project.into(),
            kind,
        }
    }
}

impl fmt::Display for DiagramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.kind)
    }
}

/// Precondition attached to a diagram write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "revision", rename_all = "snake_case")]
pub enum SaveCondition {
    /// Overwrite whatever is stored.
    Any,
    /// Only write if nothing is stored yet.
    Absent,
    /// Only write if the stored revision is exactly this one.
    Revision(u64),
}

impl SaveCondition {
    /// Checks the condition against the currently stored revision.
    pub fn check(&self, key: &DiagramKey, current: Option<u64>) -> Result<(), StorageError> {
        let ok = match (self, current) {
            (SaveCondition::Any, _) => true,
            (SaveCondition::Absent, None) => true,
            (SaveCondition::Revision(want), Some(have)) => *want == have,
            _ => false,
        };
        if ok {
            return Ok(());
        }
        Err(StorageError::RevisionConflict {
            key: key.clone(),
            expected: match self {
                SaveCondition::Any => "any".to_string(),
                SaveCondition::Absent => "no row".to_string(),
                SaveCondition::Revision(r) => format!("revision {}", r),
            },
            actual: match current {
                Some(r) => format!("revision {}", r),
                None => "no row".to_string(),
            },
        })
    }
}

/// A diagram as read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDiagram {
    pub graph: DiagramGraph,
    /// Incremented on every successful write, starting at 1.
    pub revision: u64,
    /// [`crate::graph_digest`] of `graph`.
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful diagram write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub revision: u64,
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Template identifier (UUID v4 text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn generate() -> Self {
        TemplateId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-saved, diagram-kind-scoped graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "diagramType")]
    pub kind: DiagramKind,
    pub graph: DiagramGraph,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Environment variable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvVarId(pub String);

/// Prefix marking ids minted client-side for rows not yet stored.
pub const TEMP_ID_PREFIX: &str = "temp-";

impl EnvVarId {
    pub fn generate() -> Self {
        EnvVarId(Uuid::new_v4().to_string())
    }

    /// Returns `true` for client-side placeholder ids.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl fmt::Display for EnvVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A per-environment configuration variable owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVariable {
    pub id: EnvVarId,
    pub project_id: ProjectId,
    pub name: String,
    pub development: String,
    pub staging: String,
    pub production: String,
    pub is_secret: bool,
}

/// Values for inserting or updating an [`EnvVariable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvDraft {
    pub name: String,
    #[serde(default)]
    pub development: String,
    #[serde(default)]
    pub staging: String,
    #[serde(default)]
    pub production: String,
    #[serde(default)]
    pub is_secret: bool,
}

impl EnvDraft {
    pub(crate) fn into_variable(self, id: EnvVarId, project: &ProjectId) -> EnvVariable {
        EnvVariable {
            id,
            project_id: project.clone(),
            name: self.name,
            development: self.development,
            staging: self.staging,
            production: self.production,
            is_secret: self.is_secret,
        }
    }
}
