//! Application state shared by every handler.
//!
//! The workspace store sits behind a `tokio::sync::Mutex` inside
//! [`SharedStore`] because `rusqlite::Connection` is not `Sync`. Open
//! editors are kept in an [`EditorSessions`] registry, each behind its own
//! async mutex, so edits to different diagrams do not wait on each other.

use std::sync::Arc;
use std::time::Duration;

use archboard_storage::{FileLocalStore, LocalStore, MemoryLocalStore, SqliteStore, StorageError};

use crate::adapter::{share_store, SharedStore};
use crate::config::{EditorConfig, ServerConfig, DEFAULT_SESSION_IDLE};
use crate::notice::NoticeBoard;
use crate::sessions::EditorSessions;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub notices: NoticeBoard,
    pub sessions: Arc<EditorSessions>,
}

impl AppState {
    /// Opens the SQLite database and local store named by `config`.
    ///
    /// Must be called inside a tokio runtime: it starts the idle-editor sweep.
    pub fn new(config: &ServerConfig) -> Result<Self, StorageError> {
        let store = share_store(SqliteStore::new(&config.db_path)?);
        let local: Arc<dyn LocalStore> = match &config.local_dir {
            Some(dir) => Arc::new(FileLocalStore::open(dir)?),
            None => Arc::new(MemoryLocalStore::new()),
        };
        Ok(Self::with_stores(store, local, config.editor, config.session_idle))
    }

    /// State over an in-memory SQLite database (for testing).
    pub fn in_memory(editor: EditorConfig) -> Result<Self, StorageError> {
        let store = share_store(SqliteStore::in_memory()?);
        Ok(Self::with_stores(
            store,
            Arc::new(MemoryLocalStore::new()),
            editor,
            DEFAULT_SESSION_IDLE,
        ))
    }

    pub fn with_stores(
        store: SharedStore,
        local: Arc<dyn LocalStore>,
        editor: EditorConfig,
        session_idle: Duration,
    ) -> Self {
        let notices = NoticeBoard::new();
        let sessions = Arc::new(EditorSessions::new(
            store.clone(),
            local,
            notices.clone(),
            editor,
        ));
        sessions.start_idle_sweep(session_idle);
        AppState {
            store,
            notices,
            sessions,
        }
    }
}
