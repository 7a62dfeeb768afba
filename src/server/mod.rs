//! The proxy server. It re-hosts the backend operations under same-origin `/api/*` routes so
//! that the calendar client never holds the backend's token.

mod routes;

use crate::api::Upstream;
use crate::Result;
use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the router with every proxy route. Each route answers other methods with 405.
pub fn router(upstream: Arc<dyn Upstream>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/dropdown",
            get(routes::dropdown).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/event",
            post(routes::event).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/form",
            post(routes::form).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/stat",
            get(routes::stat).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/month",
            get(routes::month).fallback(routes::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(upstream)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, upstream: Arc<dyn Upstream>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind {addr}"))?;
    info!("Proxy listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(upstream))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("The proxy server stopped unexpectedly")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Unable to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
