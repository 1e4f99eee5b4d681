//! Node types for system-design diagrams.
//!
//! A node carries a [`NodeKind`] tag, a canvas [`Position`] and a
//! [`NodeData`] payload. The payload is a tagged union: only table nodes own
//! [`TableField`]s, every other kind carries plain descriptive text. On the
//! wire both shapes flatten to the same `{label, sublabel?, description?,
//! notes, fields?}` object so exported files stay readable by other tools.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Node type families. Renderers and toolbars group kinds by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeFamily {
    Backend,
    Service,
    Database,
    Frontend,
    /// Tags this build does not know about.
    Generic,
}

/// The closed set of node type tags, plus a passthrough for unknown tags.
///
/// Unknown tags are preserved as [`NodeKind::Custom`] so that a diagram
/// written by a newer client still loads and round-trips; renderers fall
/// back to a generic style for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    // Backend
    Server,
    Api,
    Gateway,
    LoadBalancer,
    Auth,
    Worker,
    Cron,
    Function,
    Websocket,
    // Services
    Queue,
    Cache,
    Cdn,
    Storage,
    Email,
    Payment,
    Search,
    Analytics,
    Monitoring,
    ExternalApi,
    MessageBroker,
    // Database
    Database,
    Table,
    View,
    Enum,
    // Frontend
    Client,
    Mobile,
    Page,
    Component,
    Layout,
    Modal,
    Form,
    Navigation,
    Store,
    Hook,
    Context,
    Router,
    /// A tag outside the known set, kept verbatim.
    Custom(String),
}

impl NodeKind {
    /// Every known kind, in toolbar order.
    pub const KNOWN: [NodeKind; 36] = [
        NodeKind::Server,
        NodeKind::Api,
        NodeKind::Gateway,
        NodeKind::LoadBalancer,
        NodeKind::Auth,
        NodeKind::Worker,
        NodeKind::Cron,
        NodeKind::Function,
        NodeKind::Websocket,
        NodeKind::Queue,
        NodeKind::Cache,
        NodeKind::Cdn,
        NodeKind::Storage,
        NodeKind::Email,
        NodeKind::Payment,
        NodeKind::Search,
        NodeKind::Analytics,
        NodeKind::Monitoring,
        NodeKind::ExternalApi,
        NodeKind::MessageBroker,
        NodeKind::Database,
        NodeKind::Table,
        NodeKind::View,
        NodeKind::Enum,
        NodeKind::Client,
        NodeKind::Mobile,
        NodeKind::Page,
        NodeKind::Component,
        NodeKind::Layout,
        NodeKind::Modal,
        NodeKind::Form,
        NodeKind::Navigation,
        NodeKind::Store,
        NodeKind::Hook,
        NodeKind::Context,
        NodeKind::Router,
    ];

    /// The wire tag for this kind.
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Server => "server",
            NodeKind::Api => "api",
            NodeKind::Gateway => "gateway",
            NodeKind::LoadBalancer => "load_balancer",
            NodeKind::Auth => "auth",
            NodeKind::Worker => "worker",
            NodeKind::Cron => "cron",
            NodeKind::Function => "function",
            NodeKind::Websocket => "websocket",
            NodeKind::Queue => "queue",
            NodeKind::Cache => "cache",
            NodeKind::Cdn => "cdn",
            NodeKind::Storage => "storage",
            NodeKind::Email => "email",
            NodeKind::Payment => "payment",
            NodeKind::Search => "search",
            NodeKind::Analytics => "analytics",
            NodeKind::Monitoring => "monitoring",
            NodeKind::ExternalApi => "external_api",
            NodeKind::MessageBroker => "message_broker",
            NodeKind::Database => "database",
            NodeKind::Table => "table",
            NodeKind::View => "view",
            NodeKind::Enum => "enum",
            NodeKind::Client => "client",
            NodeKind::Mobile => "mobile",
            NodeKind::Page => "page",
            NodeKind::Component => "component",
            NodeKind::Layout => "layout",
            NodeKind::Modal => "modal",
            NodeKind::Form => "form",
            NodeKind::Navigation => "navigation",
            NodeKind::Store => "store",
            NodeKind::Hook => "hook",
            NodeKind::Context => "context",
            NodeKind::Router => "router",
            NodeKind::Custom(tag) => tag,
        }
    }

    /// Parses a wire tag. Never fails: unknown tags become [`NodeKind::Custom`].
    pub fn from_tag(tag: &str) -> NodeKind {
        NodeKind::KNOWN
            .iter()
            .find(|k| k.tag() == tag)
            .cloned()
            .unwrap_or_else(|| NodeKind::Custom(tag.to_string()))
    }

    pub fn family(&self) -> NodeFamily {
        match self {
            NodeKind::Server
            | NodeKind::Api
            | NodeKind::Gateway
            | NodeKind::LoadBalancer
            | NodeKind::Auth
            | NodeKind::Worker
            | NodeKind::Cron
            | NodeKind::Function
            | NodeKind::Websocket => NodeFamily::Backend,
            NodeKind::Queue
            | NodeKind::Cache
            | NodeKind::Cdn
            | NodeKind::Storage
            | NodeKind::Email
            | NodeKind::Payment
            | NodeKind::Search
            | NodeKind::Analytics
            | NodeKind::Monitoring
            | NodeKind::ExternalApi
            | NodeKind::MessageBroker => NodeFamily::Service,
            NodeKind::Database | NodeKind::Table | NodeKind::View | NodeKind::Enum => {
                NodeFamily::Database
            }
            NodeKind::Client
            | NodeKind::Mobile
            | NodeKind::Page
            | NodeKind::Component
            | NodeKind::Layout
            | NodeKind::Modal
            | NodeKind::Form
            | NodeKind::Navigation
            | NodeKind::Store
            | NodeKind::Hook
            | NodeKind::Context
            | NodeKind::Router => NodeFamily::Frontend,
            NodeKind::Custom(_) => NodeFamily::Generic,
        }
    }

    /// Human-readable name, used as the default label of a new node.
    pub fn display_name(&self) -> String {
        let name = match self {
            NodeKind::Server => "Server",
            NodeKind::Api => "API",
            NodeKind::Gateway => "API Gateway",
            NodeKind::LoadBalancer => "Load Balancer",
            NodeKind::Auth => "Auth Service",
            NodeKind::Worker => "Worker",
            NodeKind::Cron => "Scheduled Job",
            NodeKind::Function => "Serverless Function",
            NodeKind::Websocket => "WebSocket",
            NodeKind::Queue => "Queue",
            NodeKind::Cache => "Cache",
            NodeKind::Cdn => "CDN",
            NodeKind::Storage => "Object Storage",
            NodeKind::Email => "Email Service",
            NodeKind::Payment => "Payments",
            NodeKind::Search => "Search",
            NodeKind::Analytics => "Analytics",
            NodeKind::Monitoring => "Monitoring",
            NodeKind::ExternalApi => "External API",
            NodeKind::MessageBroker => "Message Broker",
            NodeKind::Database => "Database",
            NodeKind::Table => "Table",
            NodeKind::View => "View",
            NodeKind::Enum => "Enum",
            NodeKind::Client => "Client",
            NodeKind::Mobile => "Mobile App",
            NodeKind::Page => "Page",
            NodeKind::Component => "Component",
            NodeKind::Layout => "Layout",
            NodeKind::Modal => "Modal",
            NodeKind::Form => "Form",
            NodeKind::Navigation => "Navigation",
            NodeKind::Store => "State Store",
            NodeKind::Hook => "Hook",
            NodeKind::Context => "Context",
            NodeKind::Router => "Router",
            NodeKind::Custom(tag) => return tag.clone(),
        };
        name.to_string()
    }

    /// Default technology hint shown under the label, if the kind has one.
    fn default_sublabel(&self) -> Option<&'static str> {
        match self {
            NodeKind::Server => Some("Node.js"),
            NodeKind::Api => Some("REST"),
            NodeKind::Database => Some("PostgreSQL"),
            NodeKind::Cache => Some("Redis"),
            NodeKind::Queue => Some("RabbitMQ"),
            NodeKind::MessageBroker => Some("Kafka"),
            NodeKind::Storage => Some("S3"),
            NodeKind::Client => Some("Web App"),
            NodeKind::Mobile => Some("iOS / Android"),
            _ => None,
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::from_tag(&tag)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.tag().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Canvas position of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// A column of a table node.
///
/// A field should not be both a primary and a foreign key; the setters keep
/// the two flags mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    pub name: String,
    /// Free-form column type tag (`uuid`, `varchar`, ...).
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(rename = "isPK", default)]
    pub is_pk: bool,
    #[serde(rename = "isFK", default)]
    pub is_fk: bool,
}

impl TableField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        TableField {
            name: name.into(),
            ty: ty.into(),
            is_pk: false,
            is_fk: false,
        }
    }

    pub fn primary_key(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let mut field = TableField::new(name, ty);
        field.set_primary_key(true);
        field
    }

    /// Sets the PK flag; turning it on clears FK.
    pub fn set_primary_key(&mut self, on: bool) {
        self.is_pk = on;
        if on {
            self.is_fk = false;
        }
    }

    /// Sets the FK flag; turning it on clears PK.
    pub fn set_foreign_key(&mut self, on: bool) {
        self.is_fk = on;
        if on {
            self.is_pk = false;
        }
    }
}

/// Descriptive text shared by every node payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeText {
    pub label: String,
    pub sublabel: Option<String>,
    pub description: Option<String>,
    pub notes: Vec<String>,
}

/// Per-node payload, tagged by family.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Any non-table node.
    Component(NodeText),
    /// A database table with its columns.
    Table {
        text: NodeText,
        fields: Vec<TableField>,
    },
}

impl NodeData {
    /// Default payload for a freshly added node of `kind`.
    ///
    /// Tables are seeded with an `id` primary key and two placeholder columns.
    pub fn defaults_for(kind: &NodeKind) -> NodeData {
        let text = NodeText {
            label: kind.display_name(),
            sublabel: kind.default_sublabel().map(str::to_string),
            description: None,
            notes: Vec::new(),
        };
        match kind {
            NodeKind::Table => NodeData::Table {
                text: NodeText {
                    label: "new_table".to_string(),
                    ..text
                },
                fields: vec![
                    TableField::primary_key("id", "uuid"),
                    TableField::new("name", "varchar"),
                    TableField::new("created_at", "timestamp"),
                ],
            },
            _ => NodeData::Component(text),
        }
    }

    pub fn text(&self) -> &NodeText {
        match self {
            NodeData::Component(text) => text,
            NodeData::Table { text, .. } => text,
        }
    }

    pub fn text_mut(&mut self) -> &mut NodeText {
        match self {
            NodeData::Component(text) => text,
            NodeData::Table { text, .. } => text,
        }
    }

    pub fn label(&self) -> &str {
        &self.text().label
    }

    /// Table columns, or `None` for non-table nodes.
    pub fn fields(&self) -> Option<&[TableField]> {
        match self {
            NodeData::Component(_) => None,
            NodeData::Table { fields, .. } => Some(fields),
        }
    }
}

/// Partial update for a node's payload. Absent members are left untouched;
/// an empty `sublabel` or `description` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableField>>,
}

impl NodePatch {
    pub fn label(label: impl Into<String>) -> Self {
        NodePatch {
            label: Some(label.into()),
            ..NodePatch::default()
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A vertex of a diagram graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    /// Creates a node of `kind` with its default payload.
    pub fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        let data = NodeData::defaults_for(&kind);
        Node {
            id,
            kind,
            position,
            data,
        }
    }

    /// Merges `patch` into the payload. Returns `false` (and changes nothing)
    /// when the patch carries fields for a non-table node.
    pub(crate) fn apply_patch(&mut self, patch: NodePatch) -> bool {
        if patch.fields.is_some() && self.data.fields().is_none() {
            return false;
        }
        let NodePatch {
            label,
            sublabel,
            description,
            notes,
            fields,
        } = patch;

        let text = self.data.text_mut();
        if let Some(label) = label {
            text.label = label;
        }
        if let Some(sublabel) = sublabel {
            text.sublabel = non_empty(sublabel);
        }
        if let Some(description) = description {
            text.description = non_empty(description);
        }
        if let Some(notes) = notes {
            text.notes = notes;
        }
        if let (Some(new_fields), NodeData::Table { fields, .. }) = (fields, &mut self.data) {
            *fields = new_fields;
        }
        true
    }
}

/// Flat wire shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: DataRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DataRecord {
    #[serde(default)]
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sublabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<TableField>>,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let DataRecord {
            label,
            sublabel,
            description,
            notes,
            fields,
        } = record.data;
        let text = NodeText {
            label,
            sublabel,
            description,
            notes,
        };
        let data = match record.kind {
            NodeKind::Table => NodeData::Table {
                text,
                fields: fields.unwrap_or_default(),
            },
            _ => NodeData::Component(text),
        };
        Node {
            id: record.id,
            kind: record.kind,
            position: record.position,
            data,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let (text, fields) = match node.data {
            NodeData::Component(text) => (text, None),
            NodeData::Table { text, fields } => (text, Some(fields)),
        };
        NodeRecord {
            id: node.id,
            kind: node.kind,
            position: node.position,
            data: DataRecord {
                label: text.label,
                sublabel: text.sublabel,
                description: text.description,
                notes: text.notes,
                fields,
            },
        }
    }
}
