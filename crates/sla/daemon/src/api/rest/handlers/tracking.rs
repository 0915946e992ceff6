//! Tracking record handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use sla_types::{SlaTrackingRecord, TicketId};

/// Get the tracking record of a ticket
pub async fn get_tracking_record(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<SlaTrackingRecord>> {
    let id = TicketId::new(ticket_id);
    state
        .tracking
        .find_record(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No tracking record for ticket {}", id)))
}
