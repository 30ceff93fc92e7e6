//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::fade::FadeController;
use crate::state::SharedState;
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub controller: Arc<FadeController>,
}

impl AppContext {
    pub fn new(controller: FadeController) -> Self {
        let state = Arc::clone(controller.state());
        Self {
            state,
            controller: Arc::new(controller),
        }
    }
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Fade triggers (GET or POST, no body required)
        .route(
            "/fadein",
            get(super::handlers::fade_in).post(super::handlers::fade_in),
        )
        .route(
            "/fadeout",
            get(super::handlers::fade_out).post(super::handlers::fade_out),
        )
        .route("/health", get(super::handlers::health))
        .route("/status", get(super::handlers::status))
        .route("/audio/devices", get(super::handlers::list_audio_devices))
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until `shutdown` resolves.
///
/// Fade sessions already running keep their own threads and are not waited
/// for.
pub async fn run(
    addr: SocketAddr,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}
