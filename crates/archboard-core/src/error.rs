//! Core error types for archboard-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! graph mutations and the import path.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// Errors produced by graph mutations.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// An edge id was not found in the graph.
    #[error("edge not found: {id}")]
    EdgeNotFound { id: EdgeId },

    /// Two nodes share the same id.
    #[error("duplicate node id: {id}")]
    DuplicateNodeId { id: NodeId },

    /// Two edges share the same id.
    #[error("duplicate edge id: {id}")]
    DuplicateEdgeId { id: EdgeId },

    /// An edge names an endpoint that is not in the graph.
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    /// Table fields were supplied for a node that is not a table.
    #[error("node {id} is not a table and cannot hold fields")]
    FieldsOnNonTable { id: NodeId },
}

/// Errors produced while parsing an imported diagram file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload lacks a `nodes` or `edges` array.
    #[error("invalid diagram file: expected both `nodes` and `edges` arrays")]
    MissingCollections,

    /// The nodes and edges do not form a consistent graph.
    #[error("invalid diagram graph: {0}")]
    Graph(#[from] CoreError),
}
