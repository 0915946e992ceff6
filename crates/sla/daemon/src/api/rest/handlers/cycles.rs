//! Cycle handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use sla_engine::CycleReport;

/// Run one cycle now and return its report
pub async fn run_cycle(State(state): State<AppState>) -> ApiResult<Json<CycleReport>> {
    state
        .engine
        .try_run_cycle(Utc::now())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::Conflict("An SLA cycle is already running".to_string()))
}

/// Response for a queued cycle request
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: String,
}

/// Ask the scheduler for a cycle without waiting for it
pub async fn trigger_cycle(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<TriggerResponse>)> {
    let status = state
        .scheduler
        .trigger_cycle()
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            status: status.as_str().to_string(),
        }),
    ))
}
