//! Router assembly for the archboard HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Diagram editing
        .route(
            "/projects/{project}/diagrams/{kind}",
            get(handlers::diagrams::get_diagram).post(handlers::diagrams::apply_command),
        )
        .route(
            "/projects/{project}/diagrams/{kind}/save",
            post(handlers::diagrams::save_diagram),
        )
        .route(
            "/projects/{project}/diagrams/{kind}/session",
            delete(handlers::diagrams::close_session),
        )
        // Import / export
        .route(
            "/projects/{project}/diagrams/{kind}/export",
            get(handlers::diagrams::export_json),
        )
        .route(
            "/projects/{project}/diagrams/{kind}/export.png",
            get(handlers::diagrams::export_png),
        )
        .route(
            "/projects/{project}/diagrams/{kind}/import",
            post(handlers::diagrams::import_json),
        )
        // Version history
        .route(
            "/projects/{project}/diagrams/{kind}/history",
            get(handlers::history::list_versions).post(handlers::history::create_snapshot),
        )
        .route(
            "/projects/{project}/diagrams/{kind}/history/{id}",
            delete(handlers::history::delete_version),
        )
        // Templates
        .route(
            "/templates/{kind}",
            get(handlers::templates::list_templates).post(handlers::templates::save_template),
        )
        .route(
            "/templates/id/{id}",
            delete(handlers::templates::delete_template),
        )
        // Environment configuration
        .route(
            "/projects/{project}/env",
            get(handlers::env::list_env).post(handlers::env::save_env),
        )
        .route(
            "/projects/{project}/env/{id}",
            delete(handlers::env::delete_env),
        )
        // Palette and notices
        .route("/palette/{kind}", get(handlers::palette::get_palette))
        .route("/notices", get(handlers::notices::drain_notices))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
