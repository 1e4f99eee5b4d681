//! Built-in starter templates, one per diagram kind.

use crate::error::CoreError;
use crate::graph::DiagramGraph;
use crate::kind::DiagramKind;
use crate::node::{NodeKind, NodePatch, Position, TableField};

/// A named starter graph.
#[derive(Debug, Clone)]
pub struct Starter {
    pub slug: &'static str,
    pub name: &'static str,
    pub kind: DiagramKind,
}

pub const STARTERS: [Starter; 3] = [
    Starter {
        slug: "three-tier",
        name: "Three-tier web app",
        kind: DiagramKind::Architecture,
    },
    Starter {
        slug: "users-orders",
        name: "Users and orders",
        kind: DiagramKind::Database,
    },
    Starter {
        slug: "spa-shell",
        name: "Single-page app shell",
        kind: DiagramKind::Frontend,
    },
];

/// Starters available for `kind`.
pub fn starters_for(kind: DiagramKind) -> impl Iterator<Item = &'static Starter> {
    STARTERS.iter().filter(move |s| s.kind == kind)
}

/// Looks up a starter by slug.
pub fn find_starter(slug: &str) -> Option<&'static Starter> {
    STARTERS.iter().find(|s| s.slug == slug)
}

impl Starter {
    /// Builds a fresh copy of the starter's graph.
    pub fn build(&self) -> Result<DiagramGraph, CoreError> {
        let mut graph = DiagramGraph::new();
        let chain: Vec<(NodeKind, &str)> = match self.slug {
            "three-tier" => vec![
                (NodeKind::Client, "Web App"),
                (NodeKind::LoadBalancer, "Load Balancer"),
                (NodeKind::Server, "API Server"),
                (NodeKind::Database, "Primary DB"),
            ],
            "users-orders" => vec![(NodeKind::Table, "users"), (NodeKind::Table, "orders")],
            _ => vec![
                (NodeKind::Router, "Router"),
                (NodeKind::Layout, "App Layout"),
                (NodeKind::Page, "Home"),
                (NodeKind::Store, "State Store"),
            ],
        };

        let mut ids = Vec::with_capacity(chain.len());
        for (i, (kind, label)) in chain.into_iter().enumerate() {
            let id = graph.add_node(kind, Position::new(100.0 + 250.0 * i as f64, 200.0));
            graph.update_node(&id, NodePatch::label(label))?;
            if let Some(prev) = ids.last() {
                graph.connect(prev, &id, None, None, self.kind)?;
            }
            ids.push(id);
        }

        if self.slug == "users-orders" {
            if let Some(orders) = ids.get(1) {
                let mut fk = TableField::new("user_id", "uuid");
                fk.set_foreign_key(true);
                let fields = vec![
                    TableField::primary_key("id", "uuid"),
                    fk,
                    TableField::new("total", "numeric"),
                ];
                graph.update_node(
                    orders,
                    NodePatch {
                        fields: Some(fields),
                        ..NodePatch::default()
                    },
                )?;
            }
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_starter_per_kind() {
        for kind in DiagramKind::ALL {
            assert_eq!(starters_for(kind).count(), 1);
        }
    }

    #[test]
    fn starters_build_connected_chains() {
        for starter in STARTERS.iter() {
            let graph = starter.build().unwrap();
            assert!(graph.node_count() >= 2);
            assert_eq!(graph.edge_count(), graph.node_count() - 1);
        }
    }

    #[test]
    fn orders_table_has_foreign_key() {
        let graph = find_starter("users-orders").unwrap().build().unwrap();
        let orders = graph.nodes().nth(1).unwrap();
        let fields = orders.data.fields().unwrap();
        assert!(fields.iter().any(|f| f.name == "user_id" && f.is_fk && !f.is_pk));
    }
}
