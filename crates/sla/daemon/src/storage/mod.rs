//! Storage backends
//!
//! PostgreSQL adapters for the engine's collaborator traits. The in-memory
//! backends live in `sla_engine::memory`.

mod helpdesk;
mod tracking;

pub use helpdesk::PostgresHelpdesk;
pub use tracking::PostgresTrackingStore;

use sla_types::SlaError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Open a connection pool
pub async fn connect_pool(
    url: &str,
    max_connections: u32,
    connect_timeout_secs: u64,
) -> Result<PgPool, SlaError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(connect_timeout_secs))
        .connect(url)
        .await
        .map_err(|e| SlaError::Storage(format!("connection failed: {}", e)))
}

fn query_error(e: sqlx::Error) -> SlaError {
    SlaError::Storage(e.to_string())
}
