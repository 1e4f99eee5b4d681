//! JSON import/export file format.
//!
//! Exported files look like
//! `{version, type, projectId, exportedAt, nodes, edges}`. Imports only
//! require the two arrays; everything else is informational.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::ImportError;
use crate::graph::DiagramGraph;
use crate::id::ProjectId;
use crate::kind::DiagramKind;
use crate::node::Node;

/// Format version written into exported files.
pub const FORMAT_VERSION: &str = "1.0";

/// An exported diagram file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    pub project_id: ProjectId,
    pub exported_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Builds the export document for `graph`.
pub fn export_document(
    project: &ProjectId,
    kind: DiagramKind,
    graph: &DiagramGraph,
    exported_at: DateTime<Utc>,
) -> DiagramDocument {
    DiagramDocument {
        version: FORMAT_VERSION.to_string(),
        kind,
        project_id: project.clone(),
        exported_at,
        nodes: graph.nodes().cloned().collect(),
        edges: graph.edges().cloned().collect(),
    }
}

#[derive(Deserialize)]
struct ImportPayload {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Parses an imported file into a graph.
///
/// The payload must be a JSON object holding both a `nodes` array and an
/// `edges` array; the rest of the document is ignored.
pub fn parse_import(bytes: &[u8]) -> Result<DiagramGraph, ImportError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let has_arrays = value.get("nodes").is_some_and(|v| v.is_array())
        && value.get("edges").is_some_and(|v| v.is_array());
    if !has_arrays {
        return Err(ImportError::MissingCollections);
    }
    let payload: ImportPayload = serde_json::from_value(value)?;
    Ok(DiagramGraph::from_parts(payload.nodes, payload.edges)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, Position};
    use chrono::TimeZone;

    #[test]
    fn empty_but_valid_import_yields_empty_graph() {
        let graph = parse_import(br#"{ "nodes": [], "edges": [] }"#).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn missing_either_array_is_rejected() {
        for payload in [
            r#"{ "nodes": [] }"#,
            r#"{ "edges": [] }"#,
            r#"{ "nodes": {}, "edges": [] }"#,
            r#"[]"#,
        ] {
            assert!(
                matches!(parse_import(payload.as_bytes()), Err(ImportError::MissingCollections)),
                "{payload} was accepted"
            );
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse_import(b"{nodes:"), Err(ImportError::Json(_))));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let payload = br#"{"nodes": [], "edges": [{"id": "e", "source": "a", "target": "b"}]}"#;
        assert!(matches!(parse_import(payload), Err(ImportError::Graph(_))));
    }

    #[test]
    fn exported_document_imports_back() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(NodeKind::Client, Position::new(10.0, 10.0));
        let b = graph.add_node(NodeKind::Server, Position::new(300.0, 10.0));
        graph
            .connect(&a, &b, None, None, DiagramKind::Architecture)
            .unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let doc = export_document(&ProjectId::from("p1"), DiagramKind::Architecture, &graph, at);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["type"], "architecture");
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["exportedAt"], "2026-01-02T03:04:05Z");

        let back = parse_import(&serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(back, graph);
    }
}
