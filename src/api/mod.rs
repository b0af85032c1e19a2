use axum::{Router, routing::post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::error::{BotError, Result};

pub mod handlers;
pub mod models;

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<Dispatcher>,
    pub token: Arc<str>,
}

/// Telegram posts updates to `/<token>`; any other path is rejected.
pub fn create_router(dispatcher: Arc<Dispatcher>, token: &str) -> Router {
    let state = WebhookState {
        dispatcher,
        token: Arc::from(token),
    };
    Router::new()
        .route("/:secret", post(handlers::webhook_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves the webhook router on `0.0.0.0:port` until cancelled.
pub async fn serve(router: Router, port: u16, cancel: CancellationToken) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BotError::Config(format!("cannot listen on {addr}: {e}")))?;
    tracing::info!(%addr, "listening for webhook updates");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| BotError::Transport(format!("webhook server failed: {e}")))
}
