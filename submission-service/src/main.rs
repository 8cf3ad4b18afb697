use std::net::SocketAddr;

use anyhow::Result;
use submission_service::{
    build_router,
    database::{constants::DEFAULT_DB_PATH, Database},
    state::AppState,
    utils::env_parse,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting ballot submission service");

    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let db = Database::new(&db_path)?;

    let ingest_token = std::env::var("INGEST_TOKEN").ok().filter(|t| !t.is_empty());
    if ingest_token.is_none() {
        warn!("INGEST_TOKEN not set, POST /submissions will reject every request");
    }

    let app = build_router(AppState::new(db, ingest_token));

    let port: u16 = env_parse("PORT", 3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
