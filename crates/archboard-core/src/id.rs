//! Identifier newtypes for diagram entities.
//!
//! Node and edge ids are opaque strings on the wire (the editor accepts ids
//! produced by other tools on import), so the newtypes wrap `String` rather
//! than an integer index.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node identifier, unique within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Edge identifier, unique within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

/// Identifier of the project that owns a diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl NodeId {
    /// Generates a fresh id prefixed with the node's type tag, e.g. `server-3f2a…`.
    pub fn generate(prefix: &str) -> Self {
        NodeId(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EdgeId {
    /// Generates a fresh edge id.
    pub fn generate() -> Self {
        EdgeId(format!("edge-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        ProjectId(s.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_node_ids_carry_prefix_and_differ() {
        let a = NodeId::generate("server");
        let b = NodeId::generate("server");
        assert!(a.as_str().starts_with("server-"));
        assert_ne!(a, b);
    }

    #[test]
    fn generated_edge_ids_differ() {
        assert_ne!(EdgeId::generate(), EdgeId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&NodeId::from("client-1")).unwrap();
        assert_eq!(json, "\"client-1\"");
        let back: EdgeId = serde_json::from_str("\"e1\"").unwrap();
        assert_eq!(back, EdgeId::from("e1"));
    }

    #[test]
    fn project_id_display() {
        assert_eq!(format!("{}", ProjectId::from("p1")), "p1");
    }
}
