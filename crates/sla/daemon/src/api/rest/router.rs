//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // Tracking records
        .route("/tracking/:ticket_id", get(handlers::get_tracking_record))
        // Cycles
        .route("/cycles", post(handlers::run_cycle))
        .route("/cycles/trigger", post(handlers::trigger_cycle));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
