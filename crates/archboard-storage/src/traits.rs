//! Store traits, one per persisted slice.
//!
//! The traits are synchronous: backends are driven from behind an async
//! mutex by the server, which keeps a single writer per store.

use archboard_core::{DiagramGraph, DiagramKind, ProjectId};

use crate::error::StorageError;
use crate::types::{
    DiagramKey, EnvDraft, EnvVarId, EnvVariable, SaveCondition, SaveReceipt, StoredDiagram,
    Template, TemplateId, UserId,
};

/// Live diagrams, one per `(project, kind)`.
pub trait DiagramStore {
    /// Returns the stored diagram, or `None` if nothing was ever saved.
    fn load_diagram(&self, key: &DiagramKey) -> Result<Option<StoredDiagram>, StorageError>;

    /// Upserts the full node and edge collections under `key`.
    ///
    /// Always overwrites both collections (no partial save), refreshes
    /// `updated_at` and bumps the revision. Fails with
    /// [`StorageError::RevisionConflict`] when `condition` does not hold.
    fn save_diagram(
        &mut self,
        key: &DiagramKey,
        graph: &DiagramGraph,
        condition: SaveCondition,
    ) -> Result<SaveReceipt, StorageError>;
}

/// User-owned templates.
pub trait TemplateStore {
    /// Lists `user`'s templates of `kind`, newest first.
    fn list_templates(
        &self,
        user: &UserId,
        kind: DiagramKind,
    ) -> Result<Vec<Template>, StorageError>;

    /// Stores a new template. Names need not be unique.
    fn insert_template(
        &mut self,
        user: &UserId,
        name: &str,
        kind: DiagramKind,
        graph: &DiagramGraph,
    ) -> Result<Template, StorageError>;

    /// Deletes one of `user`'s templates.
    fn delete_template(&mut self, user: &UserId, id: &TemplateId) -> Result<(), StorageError>;
}

/// Per-project environment variables.
pub trait EnvConfigStore {
    /// Lists the project's variables ordered by name.
    fn list_env(&self, project: &ProjectId) -> Result<Vec<EnvVariable>, StorageError>;

    /// Inserts a variable under a freshly generated id.
    fn insert_env(
        &mut self,
        project: &ProjectId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError>;

    /// Replaces an existing variable's values.
    fn update_env(
        &mut self,
        project: &ProjectId,
        id: &EnvVarId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError>;

    fn delete_env(&mut self, project: &ProjectId, id: &EnvVarId) -> Result<(), StorageError>;
}

/// A backend that stores every slice. Both shipped backends qualify.
pub trait WorkspaceStore: DiagramStore + TemplateStore + EnvConfigStore + Send {}

impl<T> WorkspaceStore for T where T: DiagramStore + TemplateStore + EnvConfigStore + Send {}
