//! Storage error types for archboard-storage.

use thiserror::Error;

use crate::types::DiagramKey;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite reported an error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem access for a local store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored row changed since the caller last read it.
    #[error("revision conflict on {key}: expected {expected}, found {actual}")]
    RevisionConflict {
        key: DiagramKey,
        expected: String,
        actual: String,
    },

    /// A template was not found (or is owned by someone else).
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// An environment variable was not found in the project.
    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// An environment variable with this name already exists in the project.
    #[error("environment variable '{name}' already exists")]
    DuplicateName { name: String },

    /// A stored row could not be turned back into a valid record.
    #[error("corrupt record: {reason}")]
    Corrupt { reason: String },
}
