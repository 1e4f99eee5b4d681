//! Storage abstraction for archboard diagrams, templates and environment
//! configuration.
//!
//! Each persisted slice has its own trait ([`DiagramStore`],
//! [`TemplateStore`], [`EnvConfigStore`]); [`InMemoryStore`] and
//! [`SqliteStore`] implement all three and are fully swappable.
//! [`LocalStore`] is the separate, device-local key/value store used for
//! best-effort state such as version history.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: keys, records and the save precondition
//! - [`traits`]: store trait definitions
//! - [`hash`]: content digest of a graph
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQLite connection setup and migrations
//! - [`sqlite`]: SqliteStore implementation
//! - [`local`]: device-local key/value stores

pub mod error;
pub mod hash;
pub mod local;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use hash::graph_digest;
pub use local::{FileLocalStore, LocalStore, MemoryLocalStore};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DiagramStore, EnvConfigStore, TemplateStore, WorkspaceStore};
pub use types::{
    DiagramKey, EnvDraft, EnvVarId, EnvVariable, SaveCondition, SaveReceipt, StoredDiagram,
    Template, TemplateId, UserId,
};
