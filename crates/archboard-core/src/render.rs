//! Presentational lookup from node kind to icon, color and shape.
//!
//! The renderer never fails: custom tags get [`GENERIC_STYLE`].

use serde::Serialize;

use crate::edge::{EdgeStyle, Marker};
use crate::kind::DiagramKind;
use crate::node::{NodeFamily, NodeKind};

/// Outline drawn for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Rounded,
    Cylinder,
    Hexagon,
    Table,
    Frame,
}

/// Visual attributes of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    /// Icon name from the icon set used by front ends.
    pub icon: &'static str,
    /// Accent color, `#rrggbb`.
    pub color: &'static str,
    pub shape: Shape,
}

/// Fallback style for kinds without a dedicated entry.
pub const GENERIC_STYLE: NodeStyle = NodeStyle {
    icon: "box",
    color: "#6b7280",
    shape: Shape::Rounded,
};

const fn style(icon: &'static str, color: &'static str, shape: Shape) -> NodeStyle {
    NodeStyle { icon, color, shape }
}

/// Returns the style for `kind`.
pub fn style_for(kind: &NodeKind) -> NodeStyle {
    use Shape::*;
    match kind {
        NodeKind::Server => style("server", "#3b82f6", Rounded),
        NodeKind::Api => style("plug", "#6366f1", Rounded),
        NodeKind::Gateway => style("door-open", "#8b5cf6", Hexagon),
        NodeKind::LoadBalancer => style("scale", "#0ea5e9", Hexagon),
        NodeKind::Auth => style("shield", "#ef4444", Rounded),
        NodeKind::Worker => style("cog", "#f59e0b", Rounded),
        NodeKind::Cron => style("clock", "#d97706", Rounded),
        NodeKind::Function => style("zap", "#eab308", Rounded),
        NodeKind::Websocket => style("radio", "#14b8a6", Rounded),
        NodeKind::Queue => style("list-ordered", "#f97316", Rounded),
        NodeKind::Cache => style("gauge", "#dc2626", Cylinder),
        NodeKind::Cdn => style("globe", "#06b6d4", Hexagon),
        NodeKind::Storage => style("hard-drive", "#84cc16", Cylinder),
        NodeKind::Email => style("mail", "#ec4899", Rounded),
        NodeKind::Payment => style("credit-card", "#10b981", Rounded),
        NodeKind::Search => style("search", "#a855f7", Rounded),
        NodeKind::Analytics => style("bar-chart", "#0891b2", Rounded),
        NodeKind::Monitoring => style("activity", "#e11d48", Rounded),
        NodeKind::ExternalApi => style("cloud", "#64748b", Rounded),
        NodeKind::MessageBroker => style("git-branch", "#ea580c", Hexagon),
        NodeKind::Database => style("database", "#22c55e", Cylinder),
        NodeKind::Table => style("table", "#16a34a", Table),
        NodeKind::View => style("eye", "#059669", Table),
        NodeKind::Enum => style("list", "#65a30d", Table),
        NodeKind::Client => style("monitor", "#2563eb", Frame),
        NodeKind::Mobile => style("smartphone", "#7c3aed", Frame),
        NodeKind::Page => style("file", "#0284c7", Frame),
        NodeKind::Component => style("puzzle", "#4f46e5", Rounded),
        NodeKind::Layout => style("layout", "#0369a1", Frame),
        NodeKind::Modal => style("square-stack", "#9333ea", Rounded),
        NodeKind::Form => style("text-cursor", "#c026d3", Rounded),
        NodeKind::Navigation => style("menu", "#0d9488", Rounded),
        NodeKind::Store => style("boxes", "#b45309", Cylinder),
        NodeKind::Hook => style("anchor", "#be185d", Rounded),
        NodeKind::Context => style("share-2", "#4338ca", Rounded),
        NodeKind::Router => style("signpost", "#15803d", Hexagon),
        NodeKind::Custom(_) => GENERIC_STYLE,
    }
}

/// Default styling for edges created on a diagram of `kind`.
pub fn default_edge_style(kind: DiagramKind) -> EdgeStyle {
    match kind {
        DiagramKind::Architecture => EdgeStyle {
            animated: true,
            stroke: "#64748b".to_string(),
            marker: Marker::ArrowClosed,
        },
        DiagramKind::Database => EdgeStyle {
            animated: false,
            stroke: "#16a34a".to_string(),
            marker: Marker::ArrowClosed,
        },
        DiagramKind::Frontend => EdgeStyle {
            animated: false,
            stroke: "#2563eb".to_string(),
            marker: Marker::ArrowClosed,
        },
    }
}

/// A toolbar section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteGroup {
    pub family: NodeFamily,
    pub kinds: Vec<NodeKind>,
}

/// Toolbar contents for a diagram kind, grouped by family.
pub fn palette(kind: DiagramKind) -> Vec<PaletteGroup> {
    let families: &[NodeFamily] = match kind {
        DiagramKind::Architecture => &[NodeFamily::Backend, NodeFamily::Service, NodeFamily::Database],
        DiagramKind::Database => &[NodeFamily::Database],
        DiagramKind::Frontend => &[NodeFamily::Frontend, NodeFamily::Backend],
    };
    families
        .iter()
        .map(|family| PaletteGroup {
            family: *family,
            kinds: NodeKind::KNOWN
                .iter()
                .filter(|k| k.family() == *family)
                .cloned()
                .collect(),
        })
        .collect()
}
