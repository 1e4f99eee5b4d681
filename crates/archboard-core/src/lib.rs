pub mod edge;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod id;
pub mod kind;
pub mod node;
pub mod render;
pub mod starters;

// Re-export commonly used types
pub use edge::{Edge, EdgeStyle, Handle, Marker};
pub use error::{CoreError, ImportError};
pub use exchange::{export_document, parse_import, DiagramDocument};
pub use graph::{DiagramGraph, RemovedItems};
pub use id::{EdgeId, NodeId, ProjectId};
pub use kind::{DiagramKind, UnknownDiagramKind};
pub use node::{Node, NodeData, NodeFamily, NodeKind, NodePatch, NodeText, Position, TableField};
pub use render::{palette, style_for, NodeStyle, PaletteGroup, Shape};
