//! Device-local version history for one diagram.
//!
//! Snapshots of the live graph are kept in a [`LocalStore`] under
//! `version-history-{kind}-{project}` as a JSON array, newest first. At most
//! [`MAX_VERSIONS`] are kept; older ones are evicted. This is a best-effort
//! safety net, not an undo log: nothing is synchronized between devices and a
//! corrupt history is reset rather than reported.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use archboard_core::{DiagramGraph, DiagramKind, Edge, Node, ProjectId};
use archboard_storage::{LocalStore, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_VERSIONS: usize = 10;

/// One stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl VersionEntry {
    fn capture(graph: &DiagramGraph, timestamp: DateTime<Utc>) -> Self {
        VersionEntry {
            id: Uuid::new_v4().to_string(),
            timestamp,
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        }
    }

    /// Rebuilds the snapshot as a graph.
    pub fn to_graph(&self) -> Result<DiagramGraph, HistoryError> {
        DiagramGraph::from_parts(self.nodes.clone(), self.edges.clone())
            .map_err(|err| HistoryError::Corrupt(err.to_string()))
    }

    fn same_content(&self, graph: &DiagramGraph) -> bool {
        self.nodes.iter().eq(graph.nodes()) && self.edges.iter().eq(graph.edges())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("version not found: {0}")]
    NotFound(String),

    #[error("stored version is unusable: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Version history of one `(project, kind)`. Cheap to clone; clones share
/// one write lock, so read-modify-write updates through any of them are
/// serialized.
#[derive(Clone)]
pub struct VersionHistory {
    local: Arc<dyn LocalStore>,
    key: String,
    write_lock: Arc<Mutex<()>>,
}

impl VersionHistory {
    pub fn new(local: Arc<dyn LocalStore>, project: &ProjectId, kind: DiagramKind) -> Self {
        VersionHistory {
            local,
            key: format!("version-history-{}-{}", kind, project),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Prepends a snapshot of `graph`, evicting the oldest past the cap.
    ///
    /// Returns `None` without writing when the graph is empty or identical to
    /// the newest snapshot.
    pub fn snapshot(&self, graph: &DiagramGraph) -> Result<Option<VersionEntry>, HistoryError> {
        self.snapshot_at(graph, Utc::now())
    }

    pub fn snapshot_at(
        &self,
        graph: &DiagramGraph,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<VersionEntry>, HistoryError> {
        if graph.is_empty() {
            return Ok(None);
        }
        let _guard = self.lock();
        let mut entries = self.list()?;
        if entries.first().is_some_and(|newest| newest.same_content(graph)) {
            return Ok(None);
        }
        let entry = VersionEntry::capture(graph, timestamp);
        entries.insert(0, entry.clone());
        entries.truncate(MAX_VERSIONS);
        self.write(&entries)?;
        tracing::debug!(key = %self.key, versions = entries.len(), "version snapshot stored");
        Ok(Some(entry))
    }

    /// All snapshots, newest first.
    pub fn list(&self) -> Result<Vec<VersionEntry>, HistoryError> {
        let Some(raw) = self.local.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "discarding unreadable version history");
                Ok(Vec::new())
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<VersionEntry, HistoryError> {
        self.list()?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))
    }

    pub fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let _guard = self.lock();
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        self.write(&entries)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.lock();
        self.local.remove(&self.key)?;
        Ok(())
    }

    fn write(&self, entries: &[VersionEntry]) -> Result<(), HistoryError> {
        let raw = serde_json::to_string(entries).map_err(StorageError::from)?;
        self.local.set(&self.key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archboard_core::{NodeKind, Position};
    use archboard_storage::MemoryLocalStore;
    use chrono::TimeZone;

    fn history() -> VersionHistory {
        VersionHistory::new(
            Arc::new(MemoryLocalStore::new()),
            &ProjectId::from("p1"),
            DiagramKind::Architecture,
        )
    }

    fn graph_with(n: usize) -> DiagramGraph {
        let mut graph = DiagramGraph::new();
        for i in 0..n {
            graph.add_node(NodeKind::Api, Position::new(i as f64, 0.0));
        }
        graph
    }

    #[test]
    fn key_names_kind_then_project() {
        assert_eq!(history().storage_key(), "version-history-architecture-p1");
    }

    #[test]
    fn empty_graphs_are_not_snapshotted() {
        let history = history();
        assert!(history.snapshot(&DiagramGraph::new()).unwrap().is_none());
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn newest_first_and_capped() {
        let history = history();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut ids = Vec::new();
        for i in 1..=11 {
            let entry = history
                .snapshot_at(&graph_with(i), base + chrono::Duration::minutes(i as i64))
                .unwrap()
                .unwrap();
            ids.push(entry.id);
        }
        let entries = history.list().unwrap();
        assert_eq!(entries.len(), MAX_VERSIONS);
        assert_eq!(entries[0].id, ids[10]);
        assert_eq!(entries[0].node_count, 11);
        assert!(entries.iter().all(|e| e.id != ids[0]));
        assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn repeated_snapshot_of_same_graph_is_skipped() {
        let history = history();
        let graph = graph_with(2);
        assert!(history.snapshot(&graph).unwrap().is_some());
        assert!(history.snapshot(&graph).unwrap().is_none());
        assert_eq!(history.list().unwrap().len(), 1);
    }

    #[test]
    fn get_restores_the_graph() {
        let history = history();
        let graph = graph_with(3);
        let entry = history.snapshot(&graph).unwrap().unwrap();
        let restored = history.get(&entry.id).unwrap().to_graph().unwrap();
        assert_eq!(restored, graph);
        assert!(matches!(history.get("missing"), Err(HistoryError::NotFound(_))));
    }

    #[test]
    fn delete_and_clear() {
        let history = history();
        let first = history.snapshot(&graph_with(1)).unwrap().unwrap();
        history.snapshot(&graph_with(2)).unwrap();
        history.delete(&first.id).unwrap();
        assert_eq!(history.list().unwrap().len(), 1);
        assert!(matches!(history.delete(&first.id), Err(HistoryError::NotFound(_))));
        history.clear().unwrap();
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn unreadable_history_reads_as_empty() {
        let local = Arc::new(MemoryLocalStore::new());
        local.set("version-history-database-p1", "{not json").unwrap();
        let history = VersionHistory::new(local, &ProjectId::from("p1"), DiagramKind::Database);
        assert!(history.list().unwrap().is_empty());
        history.snapshot(&graph_with(1)).unwrap();
        assert_eq!(history.list().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_updates_through_clones_are_not_lost() {
        let history = history();
        let workers: Vec<_> = (1..=MAX_VERSIONS)
            .map(|n| {
                let history = history.clone();
                std::thread::spawn(move || {
                    history.snapshot(&graph_with(n)).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(history.list().unwrap().len(), MAX_VERSIONS);

        let doomed: Vec<String> = history.list().unwrap().into_iter().map(|e| e.id).collect();
        let deleters: Vec<_> = doomed
            .into_iter()
            .map(|id| {
                let history = history.clone();
                std::thread::spawn(move || history.delete(&id).unwrap())
            })
            .collect();
        for deleter in deleters {
            deleter.join().unwrap();
        }
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn similar_project_ids_keep_separate_file_histories() {
        let dir = tempfile::tempdir().unwrap();
        let local: Arc<dyn LocalStore> =
            Arc::new(archboard_storage::FileLocalStore::open(dir.path()).unwrap());
        let dotted = VersionHistory::new(
            local.clone(),
            &ProjectId::from("acme.web"),
            DiagramKind::Architecture,
        );
        let underscored = VersionHistory::new(
            local,
            &ProjectId::from("acme_web"),
            DiagramKind::Architecture,
        );

        dotted.snapshot(&graph_with(2)).unwrap();
        assert_eq!(dotted.list().unwrap().len(), 1);
        assert!(underscored.list().unwrap().is_empty());
    }
}
