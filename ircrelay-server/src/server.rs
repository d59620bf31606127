//! Axum server setup and router configuration.

use crate::state::AppState;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use ircrelay_sdk::objects::HealthResponse;
use ircrelay_sdk::objects::endpoints::HEALTH_PATH;
use std::future::Future;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route(HEALTH_PATH, get(health_check))
        // Webhooks
        .merge(crate::api::router())
        // Add state to all routes
        .with_state(state)
}

/// Health check - reports the chat session state and doc index size.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let session = *state.session.borrow();
    Json(HealthResponse {
        status: "healthy".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        session: session.to_string(),
        doc_pages: state.doc_index.load().await.len(),
    })
}

/// Run the server on an already bound listener until `shutdown` completes.
pub async fn run_server(
    router: Router,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
