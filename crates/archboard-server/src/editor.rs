//! Editor controller for one open diagram.
//!
//! An [`Editor`] owns the live graph of one `(project, kind)` and moves
//! through three phases: `Uninitialized`, `Loading`, `Ready`. Mutations are
//! rejected until the first load has finished, so the initial read is never
//! echoed back as a save.
//!
//! Every mutation republishes the graph on a watch channel (read by the
//! periodic version snapshot task) and, while auto-save is on, hands a copy
//! to the [`SaveScheduler`]. Restoring a version, importing a file and
//! applying a template all replace the graph through the same path.

use std::collections::BTreeSet;

use archboard_core::graph::scatter_position;
use archboard_core::{
    export_document, parse_import, CoreError, DiagramDocument, DiagramGraph, DiagramKind,
    EdgeId, Handle, ImportError, NodeId, NodeKind, NodePatch, Position, ProjectId, RemovedItems,
};
use archboard_storage::graph_digest;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapter::PersistenceAdapter;
use crate::config::EditorConfig;
use crate::export::{render_png, ExportError};
use crate::history::{HistoryError, VersionEntry, VersionHistory};
use crate::notice::Notices;
use crate::scheduler::{Baseline, SaveOutcome, SaveScheduler, SaveStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorPhase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("diagram is still loading")]
    NotReady,

    #[error(transparent)]
    Graph(#[from] CoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Currently selected nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub edges: BTreeSet<EdgeId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

pub struct Editor {
    kind: DiagramKind,
    adapter: PersistenceAdapter,
    history: VersionHistory,
    config: EditorConfig,
    phase: EditorPhase,
    graph: DiagramGraph,
    selection: Selection,
    autosave: bool,
    load_failed: bool,
    live: watch::Sender<DiagramGraph>,
    scheduler: Option<SaveScheduler>,
    snapshots: Option<JoinHandle<()>>,
    rng: StdRng,
}

impl Editor {
    pub fn new(
        adapter: PersistenceAdapter,
        history: VersionHistory,
        kind: DiagramKind,
        config: EditorConfig,
    ) -> Self {
        let (live, _) = watch::channel(DiagramGraph::new());
        Editor {
            kind,
            adapter,
            history,
            config,
            phase: EditorPhase::Uninitialized,
            graph: DiagramGraph::new(),
            selection: Selection::default(),
            autosave: true,
            load_failed: false,
            live,
            scheduler: None,
            snapshots: None,
            rng: StdRng::from_entropy(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn project(&self) -> &ProjectId {
        self.adapter.project()
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// `true` when the last load failed and nothing has been saved since.
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn save_status(&self) -> SaveStatus {
        self.scheduler
            .as_ref()
            .map(SaveScheduler::status)
            .unwrap_or_default()
    }

    /// `true` when the live graph may differ from what is stored: an
    /// auto-save is pending, or the graph's digest differs from the last
    /// stored one. A never-saved empty graph counts as saved.
    pub fn has_unsaved_changes(&self) -> bool {
        let status = self.save_status();
        if status.pending {
            return true;
        }
        match status.saved_hash {
            Some(saved) => graph_digest(&self.graph).map_or(true, |digest| digest != saved),
            None => !self.graph.is_empty(),
        }
    }

    fn notices(&self) -> &Notices {
        self.adapter.notices()
    }

    fn ready(&self) -> Result<(), EditorError> {
        if self.phase == EditorPhase::Ready {
            Ok(())
        } else {
            Err(EditorError::NotReady)
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Loads the stored diagram and starts the save worker and snapshot
    /// task. Does nothing once the editor is ready.
    ///
    /// A failed read still leaves the editor ready, with an empty graph and
    /// auto-save held until a forced save.
    pub async fn open(&mut self) {
        if self.phase != EditorPhase::Uninitialized {
            return;
        }
        self.phase = EditorPhase::Loading;

        let baseline = match self.adapter.load_diagram(self.kind).await {
            Ok(Some(stored)) => {
                tracing::info!(
                    project = %self.project(),
                    kind = %self.kind,
                    nodes = stored.graph.node_count(),
                    edges = stored.graph.edge_count(),
                    revision = stored.revision,
                    "diagram loaded"
                );
                self.graph = stored.graph;
                self.load_failed = false;
                Baseline::Stored {
                    revision: stored.revision,
                    content_hash: stored.content_hash,
                }
            }
            Ok(None) => {
                self.graph = DiagramGraph::new();
                self.load_failed = false;
                Baseline::Absent
            }
            Err(_) => {
                self.graph = DiagramGraph::new();
                self.load_failed = true;
                Baseline::Unknown
            }
        };
        self.selection = Selection::default();
        self.live.send_replace(self.graph.clone());

        self.scheduler = Some(SaveScheduler::spawn(
            self.adapter.clone(),
            self.kind,
            baseline,
            self.config.autosave_delay,
        ));
        self.start_snapshots();
        self.phase = EditorPhase::Ready;
    }

    /// Drops unsaved state and loads the diagram again.
    pub async fn reload(&mut self) {
        self.stop_background();
        self.phase = EditorPhase::Uninitialized;
        self.open().await;
    }

    fn start_snapshots(&mut self) {
        let period = self.config.snapshot_interval;
        if period.is_zero() {
            return;
        }
        let history = self.history.clone();
        let live = self.live.subscribe();
        self.snapshots = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tick.tick().await;
                let graph = live.borrow().clone();
                match history.snapshot(&graph) {
                    Ok(Some(entry)) => {
                        tracing::debug!(version = %entry.id, "periodic version snapshot")
                    }
                    Ok(None) => {}
                    Err(err) => tracing::warn!(error = %err, "periodic version snapshot failed"),
                }
            }
        }));
    }

    fn stop_background(&mut self) {
        if let Some(task) = self.snapshots.take() {
            task.abort();
        }
        self.scheduler = None;
    }

    /// Publishes the graph after a mutation and queues an auto-save.
    fn changed(&mut self) {
        self.live.send_replace(self.graph.clone());
        if self.autosave {
            if let Some(scheduler) = &self.scheduler {
                scheduler.schedule(self.graph.clone());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Graph mutations
    // -----------------------------------------------------------------------

    /// Adds a node of `kind` at `position`, or at a scattered position near
    /// the top-left of the canvas when none is given.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        position: Option<Position>,
    ) -> Result<NodeId, EditorError> {
        self.ready()?;
        let position = position.unwrap_or_else(|| scatter_position(&mut self.rng));
        let id = self.graph.add_node(kind, position);
        self.changed();
        Ok(id)
    }

    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        source_handle: Option<Handle>,
        target_handle: Option<Handle>,
    ) -> Result<EdgeId, EditorError> {
        self.ready()?;
        let id = self
            .graph
            .connect(source, target, source_handle, target_handle, self.kind)?;
        self.changed();
        Ok(id)
    }

    pub fn edit_node(&mut self, id: &NodeId, patch: NodePatch) -> Result<(), EditorError> {
        self.ready()?;
        self.graph.update_node(id, patch)?;
        self.changed();
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<(), EditorError> {
        self.ready()?;
        self.graph.move_node(id, position)?;
        self.changed();
        Ok(())
    }

    pub fn label_edge(&mut self, id: &EdgeId, label: Option<String>) -> Result<(), EditorError> {
        self.ready()?;
        self.graph.set_edge_label(id, label)?;
        self.changed();
        Ok(())
    }

    /// Replaces the selection. Ids not in the graph are ignored.
    pub fn select(&mut self, nodes: Vec<NodeId>, edges: Vec<EdgeId>) -> Result<(), EditorError> {
        self.ready()?;
        self.selection = Selection {
            nodes: nodes
                .into_iter()
                .filter(|id| self.graph.contains_node(id))
                .collect(),
            edges: edges
                .into_iter()
                .filter(|id| self.graph.edge(id).is_some())
                .collect(),
        };
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Deletes the selected edges, then the selected nodes together with
    /// every edge attached to them.
    pub fn delete_selection(&mut self) -> Result<RemovedItems, EditorError> {
        self.ready()?;
        let selection = std::mem::take(&mut self.selection);
        if selection.is_empty() {
            return Ok(RemovedItems::default());
        }
        let mut removed_edges = Vec::new();
        for id in &selection.edges {
            if let Ok(edge) = self.graph.remove_edge(id) {
                removed_edges.push(edge);
            }
        }
        let mut removed = self.graph.remove_nodes(&selection.nodes);
        removed_edges.append(&mut removed.edges);
        removed.edges = removed_edges;
        self.changed();
        Ok(removed)
    }

    /// Replaces the whole graph and clears the selection.
    pub fn replace_graph(&mut self, graph: DiagramGraph) -> Result<(), EditorError> {
        self.ready()?;
        self.graph = graph;
        self.selection = Selection::default();
        self.changed();
        Ok(())
    }

    /// Clears the diagram and saves the empty graph immediately.
    pub async fn reset(&mut self) -> Result<SaveOutcome, EditorError> {
        self.ready()?;
        self.graph.clear();
        self.selection = Selection::default();
        self.live.send_replace(self.graph.clone());
        let outcome = self.flush(false).await;
        match &outcome {
            SaveOutcome::Saved { .. } => self.notices().success("Diagram cleared"),
            other => self.report_failed_save(other),
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    /// Saves the live graph now, bypassing the debounce. `force` overwrites
    /// whatever is stored, even after a failed load or a conflict.
    pub async fn save_now(&mut self, force: bool) -> Result<SaveOutcome, EditorError> {
        self.ready()?;
        let outcome = self.flush(force).await;
        match &outcome {
            SaveOutcome::Saved { .. } => self.notices().success("Diagram saved"),
            other => self.report_failed_save(other),
        }
        Ok(outcome)
    }

    async fn flush(&mut self, force: bool) -> SaveOutcome {
        let Some(scheduler) = &self.scheduler else {
            return SaveOutcome::Failed {
                message: "diagram is not open".to_string(),
            };
        };
        let outcome = scheduler.flush(self.graph.clone(), force).await;
        if matches!(outcome, SaveOutcome::Saved { .. }) {
            self.load_failed = false;
        }
        outcome
    }

    fn report_failed_save(&self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Held => self
                .notices()
                .error("The diagram could not be loaded. Reload it, or force a save to overwrite it."),
            SaveOutcome::Conflict { .. } => self
                .notices()
                .error("The diagram was changed elsewhere. Reload it or force a save."),
            SaveOutcome::Failed { message } => self
                .notices()
                .error(format!("Could not save the diagram: {}", message)),
            SaveOutcome::Saved { .. } | SaveOutcome::Unchanged => {}
        }
    }

    /// Turns auto-save on or off. Turning it off drops a pending auto-save;
    /// turning it on queues the current graph.
    pub fn set_autosave(&mut self, enabled: bool) {
        if self.autosave == enabled {
            return;
        }
        self.autosave = enabled;
        if let Some(scheduler) = &self.scheduler {
            if enabled {
                scheduler.schedule(self.graph.clone());
            } else {
                scheduler.cancel();
            }
        }
        tracing::info!(kind = %self.kind, enabled, "auto-save toggled");
    }

    // -----------------------------------------------------------------------
    // Version history
    // -----------------------------------------------------------------------

    /// Stores a snapshot of the live graph.
    pub fn snapshot_version(&self) -> Result<Option<VersionEntry>, EditorError> {
        Ok(self.history.snapshot(&self.graph)?)
    }

    pub fn versions(&self) -> Result<Vec<VersionEntry>, EditorError> {
        Ok(self.history.list()?)
    }

    /// Replaces the live graph with a stored version.
    pub fn restore_version(&mut self, id: &str) -> Result<(), EditorError> {
        self.ready()?;
        let entry = self.history.get(id).inspect_err(|err| {
            self.notices().error(format!("Could not restore version: {}", err));
        })?;
        let graph = entry.to_graph()?;
        self.replace_graph(graph)?;
        self.notices().success(format!(
            "Restored version from {}",
            entry.timestamp.format("%Y-%m-%d %H:%M")
        ));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Import / export / templates
    // -----------------------------------------------------------------------

    /// Replaces the graph with an imported file. On a malformed file the
    /// graph is left untouched and an error notice is raised.
    pub fn import_json(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        self.ready()?;
        let graph = match parse_import(bytes) {
            Ok(graph) => graph,
            Err(err) => {
                self.notices().error(format!("Import failed: {}", err));
                return Err(err.into());
            }
        };
        let (nodes, edges) = (graph.node_count(), graph.edge_count());
        self.replace_graph(graph)?;
        self.notices()
            .success(format!("Imported {} nodes and {} edges", nodes, edges));
        Ok(())
    }

    pub fn export_json(&self) -> DiagramDocument {
        export_document(self.project(), self.kind, &self.graph, Utc::now())
    }

    pub fn export_png(&self) -> Result<Vec<u8>, EditorError> {
        render_png(&self.graph).map_err(|err| {
            self.notices().error(format!("Export failed: {}", err));
            err.into()
        })
    }

    /// Loads a template's graph into the editor.
    pub fn apply_template(&mut self, name: &str, graph: DiagramGraph) -> Result<(), EditorError> {
        self.replace_graph(graph)?;
        self.notices().success(format!("Loaded template '{}'", name));
        Ok(())
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.stop_background();
    }
}
