//! Request and response types for the HTTP API.

pub mod diagrams;
pub mod env;
pub mod history;
pub mod palette;
pub mod templates;
