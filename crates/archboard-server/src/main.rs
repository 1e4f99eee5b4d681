//! Binary entrypoint for the archboard HTTP server.
//!
//! Configuration comes from `ARCHBOARD_*` environment variables; see
//! [`archboard_server::config`].

use archboard_server::config::ServerConfig;
use archboard_server::router::build_router;
use archboard_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(&config)?;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        db = %config.db_path,
        autosave_ms = config.editor.autosave_delay.as_millis() as u64,
        "archboard server starting on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
