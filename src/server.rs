//! HTTP surface for the authorizer
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /authorize` | authorizer request → policy document (200 for Allow *and* Deny) |
//! | `GET /health` | liveness |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::authorizer::{Authorizer, AuthorizerRequest};
use crate::config::ServerConfig;
use crate::{Error, Result};

/// Shared application state
pub struct AppState {
    /// Authorization pipeline
    pub authorizer: Authorizer,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/authorize", post(authorize_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn authorize_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthorizerRequest>,
) -> impl IntoResponse {
    Json(state.authorizer.authorize(&request).await)
}

/// Serve the authorizer until Ctrl-C / SIGTERM.
///
/// # Errors
///
/// Returns an error if the bind address is invalid or the listener fails.
pub async fn run(config: &ServerConfig, authorizer: Authorizer) -> Result<()> {
    let addr = SocketAddr::new(
        config
            .host
            .parse()
            .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
        config.port,
    );

    let app = create_router(Arc::new(AppState { authorizer }));
    let listener = TcpListener::bind(addr).await?;

    info!(host = %config.host, port = config.port, "Listening");
    info!("  POST http://{}:{}/authorize", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
