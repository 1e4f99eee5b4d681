//! Directed connections between diagram nodes.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};

/// Side of a node an edge is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Top,
    Right,
    Bottom,
    Left,
}

/// Arrowhead drawn at the target end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    ArrowClosed,
    Arrow,
    None,
}

/// Presentational edge attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStyle {
    #[serde(default)]
    pub animated: bool,
    /// Stroke color, `#rrggbb`.
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default)]
    pub marker: Marker,
}

fn default_stroke() -> String {
    "#64748b".to_string()
}

impl Default for EdgeStyle {
    fn default() -> Self {
        EdgeStyle {
            animated: false,
            stroke: default_stroke(),
            marker: Marker::ArrowClosed,
        }
    }
}

/// A directed edge of a diagram graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: EdgeStyle,
}

impl Edge {
    /// Returns `true` if either endpoint is `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}
