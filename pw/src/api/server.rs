//! HTTP server for the planning API

use axum::Router;
use eyre::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatch::Dispatcher;

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::plan_routes())
        .merge(routes::health_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
