//! PostgreSQL tracking store

use super::query_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sla_engine::TrackingStore;
use sla_types::{MilestoneFlags, SlaError, SlaResult, SlaTrackingRecord, TicketId};
use sqlx::{postgres::PgRow, PgPool, Row};

const SELECT_RECORD: &str = r#"
    SELECT ticket_id, first_responded_on, resolution_date,
           first_response_50, first_response_75, first_response_100,
           resolution_50, resolution_75, resolution_100,
           created_at, updated_at
    FROM sla_tracking
"#;

/// One `sla_tracking` row per ticket, keyed by ticket id
#[derive(Debug, Clone)]
pub struct PostgresTrackingStore {
    pool: PgPool,
}

impl PostgresTrackingStore {
    /// Wrap a pool and make sure the table exists
    pub async fn new(pool: PgPool) -> SlaResult<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> SlaResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sla_tracking (
                ticket_id TEXT PRIMARY KEY,
                first_responded_on TIMESTAMPTZ,
                resolution_date TIMESTAMPTZ,
                first_response_50 BOOLEAN NOT NULL DEFAULT FALSE,
                first_response_75 BOOLEAN NOT NULL DEFAULT FALSE,
                first_response_100 BOOLEAN NOT NULL DEFAULT FALSE,
                resolution_50 BOOLEAN NOT NULL DEFAULT FALSE,
                resolution_75 BOOLEAN NOT NULL DEFAULT FALSE,
                resolution_100 BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    fn record_from_row(row: &PgRow) -> SlaResult<SlaTrackingRecord> {
        let flags = |prefix: &str| -> SlaResult<MilestoneFlags> {
            let get = |pct: &str| -> SlaResult<bool> {
                row.try_get::<bool, _>(format!("{}_{}", prefix, pct).as_str())
                    .map_err(query_error)
            };
            Ok(MilestoneFlags::from_bits(get("50")?, get("75")?, get("100")?))
        };

        Ok(SlaTrackingRecord {
            ticket_id: TicketId::new(row.try_get::<String, _>("ticket_id").map_err(query_error)?),
            first_responded_on: row.try_get("first_responded_on").map_err(query_error)?,
            resolution_date: row.try_get("resolution_date").map_err(query_error)?,
            first_response: flags("first_response")?,
            resolution: flags("resolution")?,
            created_at: row.try_get("created_at").map_err(query_error)?,
            updated_at: row.try_get("updated_at").map_err(query_error)?,
        })
    }
}

#[async_trait]
impl TrackingStore for PostgresTrackingStore {
    async fn find_record(&self, ticket_id: &TicketId) -> SlaResult<Option<SlaTrackingRecord>> {
        let row = sqlx::query(&format!("{} WHERE ticket_id = $1", SELECT_RECORD))
            .bind(ticket_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn create_record(
        &self,
        ticket_id: &TicketId,
        now: DateTime<Utc>,
    ) -> SlaResult<SlaTrackingRecord> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO sla_tracking (ticket_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (ticket_id) DO NOTHING
            RETURNING ticket_id
            "#,
        )
        .bind(ticket_id.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match inserted {
            Some(_) => Ok(SlaTrackingRecord::new(ticket_id.clone(), now)),
            None => Err(SlaError::RecordConflict(ticket_id.clone())),
        }
    }

    async fn save_record(&self, record: &SlaTrackingRecord) -> SlaResult<()> {
        let [fr_50, fr_75, fr_100] = record.first_response.bits();
        let [res_50, res_75, res_100] = record.resolution.bits();

        // Flags are OR-ed and timestamps COALESCE-d so a stale writer can
        // never undo what is already stored.
        let result = sqlx::query(
            r#"
            UPDATE sla_tracking SET
                first_responded_on = COALESCE(first_responded_on, $2),
                resolution_date = COALESCE(resolution_date, $3),
                first_response_50 = first_response_50 OR $4,
                first_response_75 = first_response_75 OR $5,
                first_response_100 = first_response_100 OR $6,
                resolution_50 = resolution_50 OR $7,
                resolution_75 = resolution_75 OR $8,
                resolution_100 = resolution_100 OR $9,
                updated_at = GREATEST(updated_at, $10)
            WHERE ticket_id = $1
            "#,
        )
        .bind(record.ticket_id.as_str())
        .bind(record.first_responded_on)
        .bind(record.resolution_date)
        .bind(fr_50)
        .bind(fr_75)
        .bind(fr_100)
        .bind(res_50)
        .bind(res_75)
        .bind(res_100)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(SlaError::Storage(format!(
                "no tracking record for {}",
                record.ticket_id
            )));
        }

        Ok(())
    }
}
