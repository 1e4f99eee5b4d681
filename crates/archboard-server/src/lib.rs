//! HTTP/JSON service hosting archboard diagram editors.
//!
//! Each open diagram is driven by an [`editor::Editor`] that owns the live
//! graph, talks to storage through the [`adapter::PersistenceAdapter`], and
//! pushes edits back with a debounced [`scheduler::SaveScheduler`]. Version
//! history, PNG/JSON export and templates operate on the same live graph.
//! The axum router exposes all of it as a REST API.

pub mod adapter;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod handlers;
pub mod history;
pub mod notice;
pub mod router;
pub mod scheduler;
pub mod schema;
pub mod sessions;
pub mod state;
