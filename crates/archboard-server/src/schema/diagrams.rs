//! Diagram view and editor command types.

use archboard_core::{
    DiagramKind, Edge, EdgeId, Handle, Node, NodeId, NodeKind, NodePatch, Position, ProjectId,
};
use serde::{Deserialize, Serialize};

use crate::editor::{Editor, EditorPhase, Selection};
use crate::scheduler::{SaveOutcome, SaveStatus};

/// Full state of one open diagram.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramView {
    pub project_id: ProjectId,
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    pub phase: EditorPhase,
    pub autosave: bool,
    pub load_failed: bool,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub selection: Selection,
    pub save: SaveStatus,
}

impl DiagramView {
    pub fn of(editor: &Editor) -> Self {
        DiagramView {
            project_id: editor.project().clone(),
            kind: editor.kind(),
            phase: editor.phase(),
            autosave: editor.autosave(),
            load_failed: editor.load_failed(),
            nodes: editor.graph().nodes().cloned().collect(),
            edges: editor.graph().edges().cloned().collect(),
            selection: editor.selection().clone(),
            save: editor.save_status(),
        }
    }
}

/// An editor operation, tagged by `op`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    AddNode {
        kind: NodeKind,
        #[serde(default)]
        position: Option<Position>,
    },
    Connect {
        source: NodeId,
        target: NodeId,
        #[serde(default)]
        source_handle: Option<Handle>,
        #[serde(default)]
        target_handle: Option<Handle>,
    },
    EditNode {
        id: NodeId,
        patch: NodePatch,
    },
    MoveNode {
        id: NodeId,
        position: Position,
    },
    LabelEdge {
        id: EdgeId,
        #[serde(default)]
        label: Option<String>,
    },
    Select {
        #[serde(default)]
        nodes: Vec<NodeId>,
        #[serde(default)]
        edges: Vec<EdgeId>,
    },
    ClearSelection,
    DeleteSelection,
    /// Clears the diagram and saves immediately.
    Reset,
    SetAutosave {
        enabled: bool,
    },
    RestoreVersion {
        id: String,
    },
    /// Loads a saved template, or a built-in starter when `id` is
    /// `starter:<slug>`.
    ApplyTemplate {
        id: String,
    },
    /// Discards unsaved edits and loads the stored diagram again.
    Reload,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovedCounts {
    pub nodes: usize,
    pub edges: usize,
}

/// Result of a [`Command`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovedCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<SaveOutcome>,
    pub view: DiagramView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    /// Overwrite the stored diagram even if it changed elsewhere.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub outcome: SaveOutcome,
    pub view: DiagramView,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseResponse {
    pub closed: bool,
}
