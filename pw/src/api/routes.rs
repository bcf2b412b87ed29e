//! API routes for the planning dispatcher

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dispatch::DispatchResult;
use crate::planner::PlanRequest;

use super::server::AppState;

type AppStateArc = Arc<AppState>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn plan_routes() -> Router<AppStateArc> {
    Router::new().route("/plan", post(plan))
}

/// Dispatch one plan request.
///
/// Only a malformed request produces an error status; every upstream failure
/// resolves to a 200 with a (possibly degraded) itinerary.
async fn plan(
    State(state): State<AppStateArc>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<DispatchResult>, (StatusCode, Json<ErrorBody>)> {
    debug!(query_len = req.query.len(), "plan: request received");

    match state.dispatcher.dispatch(req).await {
        Ok(result) => {
            debug!(source_tier = %result.source_tier, degraded = result.degraded, "plan: dispatched");
            Ok(Json(result))
        }
        Err(e) => {
            warn!(error = %e, "plan: rejected request");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: e.to_string() }),
            ))
        }
    }
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
