//! Toolbar palette response types.

use archboard_core::{style_for, DiagramKind, NodeFamily, NodeKind, PaletteGroup, Shape};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PaletteItem {
    pub kind: NodeKind,
    pub label: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub shape: Shape,
}

impl From<&NodeKind> for PaletteItem {
    fn from(kind: &NodeKind) -> Self {
        let style = style_for(kind);
        PaletteItem {
            kind: kind.clone(),
            label: kind.display_name(),
            icon: style.icon,
            color: style.color,
            shape: style.shape,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaletteSection {
    pub family: NodeFamily,
    pub items: Vec<PaletteItem>,
}

impl From<&PaletteGroup> for PaletteSection {
    fn from(group: &PaletteGroup) -> Self {
        PaletteSection {
            family: group.family,
            items: group.kinds.iter().map(PaletteItem::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaletteResponse {
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    pub sections: Vec<PaletteSection>,
}
