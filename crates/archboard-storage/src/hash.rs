//! Deterministic content digest of a diagram graph using blake3.
//!
//! The digest is taken over the graph's canonical JSON serialization, so it
//! changes with any node, edge, payload, position or ordering change. The
//! save scheduler compares digests to skip writes that would store exactly
//! what is already there.

use archboard_core::DiagramGraph;

use crate::error::StorageError;

/// Returns the hex blake3 digest of `graph`.
pub fn graph_digest(graph: &DiagramGraph) -> Result<String, StorageError> {
    let mut hasher = blake3::Hasher::new();
    // blake3::Hasher implements io::Write, so the JSON streams straight in.
    serde_json::to_writer(&mut hasher, graph)?;
    Ok(hasher.finalize().to_hex().to_string())
}
