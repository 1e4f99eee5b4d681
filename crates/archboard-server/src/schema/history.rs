//! Version history response types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::VersionEntry;

/// A version without its graph payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl From<&VersionEntry> for VersionSummary {
    fn from(entry: &VersionEntry) -> Self {
        VersionSummary {
            id: entry.id.clone(),
            timestamp: entry.timestamp,
            node_count: entry.node_count,
            edge_count: entry.edge_count,
        }
    }
}

/// Versions, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ListVersionsResponse {
    pub versions: Vec<VersionSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    /// `None` when nothing was stored (empty or unchanged graph).
    pub created: Option<VersionSummary>,
}
