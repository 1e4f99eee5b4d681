//! DiagramGraph: the node/edge container behind one open diagram.
//!
//! Nodes and edges are kept in insertion order (`IndexMap`) so that a graph
//! serializes back in the same order it was built or loaded. All mutations
//! go through `DiagramGraph` methods, which maintain two invariants:
//!
//! - node ids and edge ids are unique within the graph;
//! - every edge endpoint names a node that is present.
//!
//! Removing a node therefore always removes the edges attached to it.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::edge::{Edge, EdgeStyle, Handle};
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};
use crate::kind::DiagramKind;
use crate::node::{Node, NodeKind, NodePatch, Position};
use crate::render::default_edge_style;

/// Label given to new edges on database diagrams.
pub const DATABASE_EDGE_LABEL: &str = "1:N";

/// The graph of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord", into = "GraphRecord")]
pub struct DiagramGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
}

/// Items removed by [`DiagramGraph::remove_nodes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovedItems {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl DiagramGraph {
    pub fn new() -> Self {
        DiagramGraph::default()
    }

    /// Builds a graph from node and edge lists, validating id uniqueness
    /// and edge endpoints.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, CoreError> {
        let mut graph = DiagramGraph::new();
        for node in nodes {
            graph.insert_node(node)?;
        }
        for edge in edges {
            graph.insert_edge(edge)?;
        }
        Ok(graph)
    }

    /// Splits the graph into its ordered node and edge lists.
    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (
            self.nodes.into_values().collect(),
            self.edges.into_values().collect(),
        )
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    // -----------------------------------------------------------------------
    // Node mutations
    // -----------------------------------------------------------------------

    /// Inserts a fully-formed node.
    pub fn insert_node(&mut self, node: Node) -> Result<(), CoreError> {
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::DuplicateNodeId { id: node.id });
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Appends a new node of `kind` at `position` with a generated id and the
    /// kind's default payload.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let mut id = NodeId::generate(kind.tag());
        while self.nodes.contains_key(&id) {
            id = NodeId::generate(kind.tag());
        }
        self.nodes
            .insert(id.clone(), Node::new(id.clone(), kind, position));
        id
    }

    /// Merges `patch` into the node's payload.
    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        if !node.apply_patch(patch) {
            return Err(CoreError::FieldsOnNonTable { id: id.clone() });
        }
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        node.position = position;
        Ok(())
    }

    /// Removes every node in `ids` and every edge whose source or target is
    /// one of them. Ids not present in the graph are ignored.
    pub fn remove_nodes<'a, I>(&mut self, ids: I) -> RemovedItems
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let doomed: HashSet<&NodeId> = ids.into_iter().collect();
        let mut removed = RemovedItems::default();

        let edge_ids: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| doomed.contains(&e.source) || doomed.contains(&e.target))
            .map(|e| e.id.clone())
            .collect();
        for id in edge_ids {
            if let Some(edge) = self.edges.shift_remove(&id) {
                removed.edges.push(edge);
            }
        }
        for id in doomed {
            if let Some(node) = self.nodes.shift_remove(id) {
                removed.nodes.push(node);
            }
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Edge mutations
    // -----------------------------------------------------------------------

    /// Inserts a fully-formed edge. Both endpoints must exist.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), CoreError> {
        if self.edges.contains_key(&edge.id) {
            return Err(CoreError::DuplicateEdgeId { id: edge.id });
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(CoreError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Connects `source` to `target` with a generated id and the default
    /// styling for `diagram`. Database diagrams label new edges `1:N`.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        source_handle: Option<Handle>,
        target_handle: Option<Handle>,
        diagram: DiagramKind,
    ) -> Result<EdgeId, CoreError> {
        for endpoint in [source, target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(CoreError::NodeNotFound {
                    id: endpoint.clone(),
                });
            }
        }
        let mut id = EdgeId::generate();
        while self.edges.contains_key(&id) {
            id = EdgeId::generate();
        }
        let label = match diagram {
            DiagramKind::Database => Some(DATABASE_EDGE_LABEL.to_string()),
            _ => None,
        };
        let style: EdgeStyle = default_edge_style(diagram);
        self.edges.insert(
            id.clone(),
            Edge {
                id: id.clone(),
                source: source.clone(),
                target: target.clone(),
                source_handle,
                target_handle,
                label,
                style,
            },
        );
        Ok(id)
    }

    pub fn set_edge_label(&mut self, id: &EdgeId, label: Option<String>) -> Result<(), CoreError> {
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| CoreError::EdgeNotFound { id: id.clone() })?;
        edge.label = label.filter(|l| !l.is_empty());
        Ok(())
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, CoreError> {
        self.edges
            .shift_remove(id)
            .ok_or_else(|| CoreError::EdgeNotFound { id: id.clone() })
    }

    /// Drops every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

/// Picks a randomized initial position so that consecutively added nodes do
/// not land exactly on top of each other.
pub fn scatter_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position::new(rng.gen_range(100.0..500.0), rng.gen_range(100.0..400.0))
}

/// Serialized shape: two plain arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphRecord {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl TryFrom<GraphRecord> for DiagramGraph {
    type Error = CoreError;

    fn try_from(record: GraphRecord) -> Result<Self, Self::Error> {
        DiagramGraph::from_parts(record.nodes, record.edges)
    }
}

impl From<DiagramGraph> for GraphRecord {
    fn from(graph: DiagramGraph) -> Self {
        let (nodes, edges) = graph.into_parts();
        GraphRecord { nodes, edges }
    }
}
