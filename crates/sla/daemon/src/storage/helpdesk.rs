//! PostgreSQL view of the helpdesk: tickets, assignments and users
//!
//! The tables belong to the helpdesk application. This adapter reads them
//! and writes only `tickets.status`.

use super::query_error;
use async_trait::async_trait;
use sla_engine::{AssigneeDirectory, TicketStore};
use sla_types::{SlaError, SlaResult, Ticket, TicketId, TicketStatus};
use sqlx::{postgres::PgRow, PgPool, Row};

const SELECT_TICKET: &str = r#"
    SELECT id, status, creation, response_by, resolution_by,
           first_response_time, resolution_time, resolution_date
    FROM tickets
"#;

/// Assignment status that counts as open
const OPEN_ASSIGNMENT: &str = "Open";

/// Ticket store and assignee directory over the helpdesk schema
#[derive(Debug, Clone)]
pub struct PostgresHelpdesk {
    pool: PgPool,
}

impl PostgresHelpdesk {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn ticket_from_row(row: &PgRow) -> SlaResult<Ticket> {
        let status: String = row.try_get("status").map_err(query_error)?;

        Ok(Ticket {
            id: TicketId::new(row.try_get::<String, _>("id").map_err(query_error)?),
            status: status.parse()?,
            creation: row.try_get("creation").map_err(query_error)?,
            response_by: row.try_get("response_by").map_err(query_error)?,
            resolution_by: row.try_get("resolution_by").map_err(query_error)?,
            first_response_time: row.try_get("first_response_time").map_err(query_error)?,
            resolution_time: row.try_get("resolution_time").map_err(query_error)?,
            resolution_date: row.try_get("resolution_date").map_err(query_error)?,
        })
    }
}

/// Every accepted spelling of `statuses`, lower-cased. Matched against
/// `lower(btrim(tickets.status))` so rows written as `In Progress` or
/// `in_progress` are listed just like `In-Progress`. Writes always use the
/// canonical spelling.
fn status_params(statuses: &[TicketStatus]) -> Vec<String> {
    statuses
        .iter()
        .flat_map(|s| s.spellings())
        .map(|spelling| spelling.to_string())
        .collect()
}

#[async_trait]
impl TicketStore for PostgresHelpdesk {
    async fn list_by_status(&self, statuses: &[TicketStatus]) -> SlaResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "{} WHERE lower(btrim(status)) = ANY($1) ORDER BY id",
            SELECT_TICKET
        ))
        .bind(status_params(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(Self::ticket_from_row).collect()
    }

    async fn get_ticket(&self, id: &TicketId) -> SlaResult<Option<Ticket>> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_TICKET))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(Self::ticket_from_row).transpose()
    }

    async fn set_status(&self, id: &TicketId, status: TicketStatus) -> SlaResult<()> {
        let result = sqlx::query("UPDATE tickets SET status = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(SlaError::TicketNotFound(id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssigneeDirectory for PostgresHelpdesk {
    async fn find_open_assignee(&self, ticket_id: &TicketId) -> SlaResult<Option<String>> {
        // Oldest open assignment wins; assignee breaks ties
        let row = sqlx::query(
            r#"
            SELECT assignee FROM ticket_assignments
            WHERE ticket_id = $1 AND status = $2
            ORDER BY created_at, assignee
            LIMIT 1
            "#,
        )
        .bind(ticket_id.as_str())
        .bind(OPEN_ASSIGNMENT)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.map(|r| r.try_get::<String, _>("assignee").map_err(query_error))
            .transpose()
    }

    async fn get_email(&self, user_id: &str) -> SlaResult<Option<String>> {
        let row = sqlx::query("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        match row {
            Some(r) => r.try_get::<Option<String>, _>("email").map_err(query_error),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_params_cover_every_spelling() {
        assert_eq!(
            status_params(&[TicketStatus::Open, TicketStatus::InProgress]),
            vec![
                "open".to_string(),
                "in-progress".to_string(),
                "in progress".to_string(),
                "in_progress".to_string(),
                "inprogress".to_string(),
            ]
        );
    }

    #[test]
    fn test_status_params_match_what_parsing_accepts() {
        for stored in ["Open", "In-Progress", "In Progress", "in_progress", " Resolved "] {
            let status: TicketStatus = stored.parse().unwrap();
            let key = stored.trim().to_lowercase();
            assert!(status_params(&[status]).contains(&key), "{stored}");
        }
    }
}
