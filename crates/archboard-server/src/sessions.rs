//! Registry of open editors, one per diagram.
//!
//! Editors are opened lazily on first access. They are dropped when closed,
//! or by the idle sweep once nobody has touched them for the idle timeout
//! and they hold nothing unsaved. Dropping an editor stops its save worker
//! and snapshot task; a pending auto-save is discarded, so callers that care
//! save first.

use std::sync::{Arc, Weak};
use std::time::Duration;

use archboard_core::{DiagramKind, ProjectId};
use archboard_storage::{DiagramKey, LocalStore};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::adapter::{PersistenceAdapter, Session, SharedStore};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::history::VersionHistory;
use crate::notice::{NoticeBoard, Notices};

pub type SharedEditor = Arc<Mutex<Editor>>;

/// Upper bound on the time between two idle sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct OpenEditor {
    editor: SharedEditor,
    touched: Instant,
}

pub struct EditorSessions {
    editors: DashMap<DiagramKey, OpenEditor>,
    histories: DashMap<DiagramKey, VersionHistory>,
    store: SharedStore,
    local: Arc<dyn LocalStore>,
    board: NoticeBoard,
    config: EditorConfig,
}

impl EditorSessions {
    pub fn new(
        store: SharedStore,
        local: Arc<dyn LocalStore>,
        board: NoticeBoard,
        config: EditorConfig,
    ) -> Self {
        EditorSessions {
            editors: DashMap::new(),
            histories: DashMap::new(),
            store,
            local,
            board,
            config,
        }
    }

    /// Notices for `session` working in `project`.
    pub fn notices(&self, project: &ProjectId, session: &Session) -> Notices {
        self.board.notices_for(session.audience(project))
    }

    /// An adapter for `project` acting as `session`.
    pub fn adapter(&self, project: ProjectId, session: Session) -> PersistenceAdapter {
        let notices = self.notices(&project, &session);
        PersistenceAdapter::new(self.store.clone(), notices, project, session)
    }

    /// The version history of one diagram. Every caller gets a handle on the
    /// same history, so concurrent snapshots and deletes are serialized.
    pub fn history(&self, project: &ProjectId, kind: DiagramKind) -> VersionHistory {
        self.histories
            .entry(DiagramKey::new(project.clone(), kind))
            .or_insert_with(|| VersionHistory::new(self.local.clone(), project, kind))
            .value()
            .clone()
    }

    /// Returns the editor for `key`, loading the diagram on first access.
    pub async fn open(&self, key: &DiagramKey) -> SharedEditor {
        let editor = {
            let mut entry = self.editors.entry(key.clone()).or_insert_with(|| {
                tracing::info!(diagram = %key, "opening editor");
                let adapter = self.adapter(key.project.clone(), Session::anonymous());
                let history = self.history(&key.project, key.kind);
                OpenEditor {
                    editor: Arc::new(Mutex::new(Editor::new(
                        adapter,
                        history,
                        key.kind,
                        self.config,
                    ))),
                    touched: Instant::now(),
                }
            });
            entry.touched = Instant::now();
            entry.editor.clone()
        };
        editor.lock().await.open().await;
        editor
    }

    /// The editor for `key` if it is already open.
    pub fn get(&self, key: &DiagramKey) -> Option<SharedEditor> {
        self.editors.get(key).map(|entry| entry.editor.clone())
    }

    /// Closes the editor for `key`. Returns `false` if none was open.
    pub fn close(&self, key: &DiagramKey) -> bool {
        let closed = self.editors.remove(key).is_some();
        if closed {
            tracing::info!(diagram = %key, "editor closed");
        }
        closed
    }

    pub fn open_count(&self) -> usize {
        self.editors.len()
    }

    /// Drops editors untouched for at least `idle` that are not in use and
    /// have nothing unsaved. Returns the keys that were dropped.
    pub fn sweep_idle(&self, idle: Duration) -> Vec<DiagramKey> {
        let now = Instant::now();
        let stale: Vec<DiagramKey> = self
            .editors
            .iter()
            .filter(|entry| now.duration_since(entry.touched) >= idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut dropped = Vec::new();
        for key in stale {
            let removed = self.editors.remove_if(&key, |_, open| {
                now.duration_since(open.touched) >= idle
                    && open
                        .editor
                        .try_lock()
                        .is_ok_and(|editor| !editor.has_unsaved_changes())
            });
            if removed.is_some() {
                self.histories.remove(&key);
                dropped.push(key);
            }
        }
        dropped
    }

    /// Spawns a background task that drops idle editors. The task ends when
    /// the registry is dropped. A zero `idle` disables the sweep.
    pub fn start_idle_sweep(self: &Arc<Self>, idle: Duration) {
        if idle.is_zero() {
            return;
        }
        let sessions: Weak<Self> = Arc::downgrade(self);
        let period = idle.min(MAX_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tick.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                let dropped = sessions.sweep_idle(idle);
                if !dropped.is_empty() {
                    tracing::info!(count = dropped.len(), "dropped idle editors");
                }
            }
        });
    }
}
