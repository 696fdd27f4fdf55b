//! HTTP server setup and routing
//!
//! Sets up the Axum router for control endpoints and SSE, and serves it
//! until the shutdown future resolves.

use crate::error::{Error, Result};
use crate::playback::LoopEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<LoopEngine>,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix)
        .route("/health", get(super::handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                .route("/sounds", get(super::handlers::list_sounds))
                // Playback control
                .route("/playback/status", get(super::handlers::get_status))
                .route("/playback/play", post(super::handlers::play))
                .route("/playback/pause", post(super::handlers::pause))
                .route("/playback/resume", post(super::handlers::resume))
                .route("/playback/stop", post(super::handlers::stop))
                // Volume
                .route("/volume", get(super::handlers::get_volume))
                .route("/volume", post(super::handlers::set_volume))
                // SSE event stream
                .route("/events", get(super::sse::event_stream)),
        )
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Serve the API on `addr` until `shutdown` resolves
pub async fn run<F>(addr: SocketAddr, engine: Arc<LoopEngine>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppContext { engine });

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
