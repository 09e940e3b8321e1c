use std::sync::Arc;

use anyhow::Context;
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use repairhub_db::{Database, DatabaseConfig};
use repairhub_server::auth::TokenService;
use repairhub_server::config::ServerConfig;
use repairhub_server::routes;
use repairhub_server::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("repairhub=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let addr = format!("0.0.0.0:{}", config.port);

    let db = Database::connect(&DatabaseConfig::from_env()?)
        .await
        .context("Failed to connect to the database")?;
    db.migrate().await?;

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_minutes);
    let state = Arc::new(AppState { db, tokens });

    let app = routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .map_response(IntoResponse::into_response)
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
    );

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
