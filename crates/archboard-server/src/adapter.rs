//! Persistence adapter between editors and the shared workspace store.
//!
//! A [`PersistenceAdapter`] is bound to one project and one caller
//! [`Session`]. It translates storage failures into [`AdapterError`]s, logs
//! them, and reports user-initiated writes through [`Notices`]. Diagram saves
//! are the exception: they come from both manual and automatic paths, so the
//! caller decides whether a save is worth a notice.

use std::sync::Arc;

use archboard_core::{DiagramGraph, DiagramKind, ProjectId};
use archboard_storage::{
    DiagramKey, DiagramStore, EnvConfigStore, EnvDraft, EnvVarId, EnvVariable, SaveCondition,
    SaveReceipt, StorageError, StoredDiagram, Template, TemplateId, TemplateStore, UserId,
    WorkspaceStore,
};
use tokio::sync::Mutex;

use crate::notice::{Audience, Notices};

/// The workspace store shared by every adapter in the process.
pub type SharedStore = Arc<Mutex<Box<dyn WorkspaceStore>>>;

/// Wraps a backend into a [`SharedStore`].
pub fn share_store<S: WorkspaceStore + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(Box::new(store)))
}

/// Who is calling. Diagrams and env config are project-scoped; templates
/// need a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { user: None }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Session {
            user: Some(UserId(id.into())),
        }
    }

    /// Where notices for this caller go while working in `project`.
    pub fn audience(&self, project: &ProjectId) -> Audience {
        match &self.user {
            Some(user) => Audience::User(user.clone()),
            None => Audience::Project(project.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("no signed-in user")]
    NoUser,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Store(String),
}

impl From<StorageError> for AdapterError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RevisionConflict { .. } => AdapterError::Conflict(err.to_string()),
            StorageError::TemplateNotFound(_) | StorageError::EnvVarNotFound(_) => {
                AdapterError::NotFound(err.to_string())
            }
            StorageError::DuplicateName { .. } => AdapterError::Validation(err.to_string()),
            other => AdapterError::Store(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct PersistenceAdapter {
    store: SharedStore,
    notices: Notices,
    project: ProjectId,
    session: Session,
}

impl PersistenceAdapter {
    pub fn new(store: SharedStore, notices: Notices, project: ProjectId, session: Session) -> Self {
        PersistenceAdapter {
            store,
            notices,
            project,
            session,
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    fn key(&self, kind: DiagramKind) -> DiagramKey {
        DiagramKey::new(self.project.clone(), kind)
    }

    fn require_user(&self) -> Result<&UserId, AdapterError> {
        self.session.user.as_ref().ok_or(AdapterError::NoUser)
    }

    // -----------------------------------------------------------------------
    // Diagrams
    // -----------------------------------------------------------------------

    /// Reads the stored diagram of `kind`.
    ///
    /// `Ok(None)` means nothing was ever saved. A read failure is logged,
    /// noticed, and returned as `Err` so callers never mistake it for an
    /// empty diagram.
    pub async fn load_diagram(
        &self,
        kind: DiagramKind,
    ) -> Result<Option<StoredDiagram>, AdapterError> {
        let key = self.key(kind);
        let result = {
            let store = self.store.lock().await;
            store.load_diagram(&key)
        };
        match result {
            Ok(found) => {
                tracing::debug!(%key, found = found.is_some(), "loaded diagram");
                Ok(found)
            }
            Err(err) => {
                tracing::error!(%key, error = %err, "failed to load diagram");
                self.notices.error(format!("Could not load the {} diagram", kind));
                Err(err.into())
            }
        }
    }

    /// Writes the full graph of `kind` under `condition`.
    pub async fn save_diagram(
        &self,
        kind: DiagramKind,
        graph: &DiagramGraph,
        condition: SaveCondition,
    ) -> Result<SaveReceipt, AdapterError> {
        let key = self.key(kind);
        let result = {
            let mut store = self.store.lock().await;
            store.save_diagram(&key, graph, condition)
        };
        match result {
            Ok(receipt) => {
                tracing::debug!(%key, revision = receipt.revision, "saved diagram");
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "failed to save diagram");
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    pub async fn load_templates(&self, kind: DiagramKind) -> Result<Vec<Template>, AdapterError> {
        let user = self.require_user()?;
        let result = {
            let store = self.store.lock().await;
            store.list_templates(user, kind)
        };
        result.map_err(|err| {
            tracing::error!(%user, error = %err, "failed to list templates");
            self.notices.error("Could not load templates");
            err.into()
        })
    }

    /// Stores `graph` as a new template named `name`.
    pub async fn save_template(
        &self,
        name: &str,
        kind: DiagramKind,
        graph: &DiagramGraph,
    ) -> Result<Template, AdapterError> {
        let user = match self.require_user() {
            Ok(user) => user,
            Err(err) => {
                self.notices.error("Sign in to save templates");
                return Err(err);
            }
        };
        let name = name.trim();
        if name.is_empty() {
            self.notices.error("Template name is required");
            return Err(AdapterError::Validation(
                "template name is required".to_string(),
            ));
        }
        let result = {
            let mut store = self.store.lock().await;
            store.insert_template(user, name, kind, graph)
        };
        match result {
            Ok(template) => {
                self.notices.success(format!("Template '{}' saved", template.name));
                Ok(template)
            }
            Err(err) => {
                tracing::error!(%user, error = %err, "failed to save template");
                self.notices.error("Could not save template");
                Err(err.into())
            }
        }
    }

    pub async fn delete_template(&self, id: &TemplateId) -> Result<(), AdapterError> {
        let user = self.require_user()?;
        let result = {
            let mut store = self.store.lock().await;
            store.delete_template(user, id)
        };
        match result {
            Ok(()) => {
                self.notices.success("Template deleted");
                Ok(())
            }
            Err(err) => {
                tracing::error!(%user, template = %id, error = %err, "failed to delete template");
                self.notices.error("Could not delete template");
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Environment configuration
    // -----------------------------------------------------------------------

    pub async fn load_env_config(&self) -> Result<Vec<EnvVariable>, AdapterError> {
        let result = {
            let store = self.store.lock().await;
            store.list_env(&self.project)
        };
        result.map_err(|err| {
            tracing::error!(project = %self.project, error = %err, "failed to list env config");
            self.notices.error("Could not load environment variables");
            err.into()
        })
    }

    /// Inserts or updates one variable.
    ///
    /// A missing id, or a client placeholder id (`temp-…`), inserts a new
    /// row with a server-generated id; any other id updates that row.
    pub async fn save_env_variable(
        &self,
        id: Option<&EnvVarId>,
        draft: EnvDraft,
    ) -> Result<EnvVariable, AdapterError> {
        if draft.name.trim().is_empty() {
            self.notices.error("Variable name is required");
            return Err(AdapterError::Validation(
                "variable name is required".to_string(),
            ));
        }
        let result = {
            let mut store = self.store.lock().await;
            match id {
                Some(id) if !id.is_temporary() => store.update_env(&self.project, id, draft),
                _ => store.insert_env(&self.project, draft),
            }
        };
        match result {
            Ok(variable) => {
                self.notices.success(format!("Saved {}", variable.name));
                Ok(variable)
            }
            Err(err) => {
                tracing::error!(project = %self.project, error = %err, "failed to save env variable");
                self.notices.error(format!("Could not save variable: {}", err));
                Err(err.into())
            }
        }
    }

    pub async fn delete_env_variable(&self, id: &EnvVarId) -> Result<(), AdapterError> {
        let result = {
            let mut store = self.store.lock().await;
            store.delete_env(&self.project, id)
        };
        match result {
            Ok(()) => {
                self.notices.success("Variable deleted");
                Ok(())
            }
            Err(err) => {
                tracing::error!(project = %self.project, error = %err, "failed to delete env variable");
                self.notices.error("Could not delete variable");
                Err(err.into())
            }
        }
    }
}
