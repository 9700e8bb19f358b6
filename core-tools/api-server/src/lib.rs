//! API Server
//!
//! HTTP surface of the pitch practice backend. Handlers reshape requests for
//! the engine's dialogue orchestrator, performance reviewer and provider
//! adapters, and forward the caller's bearer token to the conversation store.
//!
//! Errors are answered as `{"detail": "..."}` with the status assigned by
//! [`sdk::PitchErrorExt::http_status`].

pub mod auth;
pub mod cli;
pub mod commands;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use pitch_engine::config::{Config, ServerConfig};
use pitch_engine::Services;
use sdk::PitchError;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the application router with its middleware stack
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    routes::routes()
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &Config, services: Services) -> Result<(), PitchError> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| PitchError::Config(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("API server listening on http://{}", local);

    let app = app(AppState::new(services), &config.server);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("API server shutting down gracefully");
}
