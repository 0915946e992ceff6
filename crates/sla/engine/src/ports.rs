//! Collaborator interfaces
//!
//! The engine owns no storage or delivery of its own. Tickets, tracking
//! records, assignees and mail are reached through these traits so the
//! daemon can plug in PostgreSQL and a real mail relay while tests use the
//! in-memory implementations in [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sla_types::{SlaError, SlaResult, SlaTrackingRecord, Ticket, TicketId, TicketStatus};

/// Read access to tickets, plus the single status write the closer needs
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// List tickets whose status is one of `statuses`
    async fn list_by_status(&self, statuses: &[TicketStatus]) -> SlaResult<Vec<Ticket>>;

    /// Get a ticket by ID
    async fn get_ticket(&self, id: &TicketId) -> SlaResult<Option<Ticket>>;

    /// Change a ticket's status
    async fn set_status(&self, id: &TicketId, status: TicketStatus) -> SlaResult<()>;
}

/// Persistence for per-ticket tracking records
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Find the record for a ticket
    async fn find_record(&self, ticket_id: &TicketId) -> SlaResult<Option<SlaTrackingRecord>>;

    /// Atomically create an empty record for a ticket.
    ///
    /// Fails with [`SlaError::RecordConflict`] when one already exists.
    async fn create_record(
        &self,
        ticket_id: &TicketId,
        now: DateTime<Utc>,
    ) -> SlaResult<SlaTrackingRecord>;

    /// Persist a record. Must be atomic per record and must never clear a
    /// flag or overwrite a timestamp that is already stored.
    async fn save_record(&self, record: &SlaTrackingRecord) -> SlaResult<()>;
}

/// Lookup of who is working a ticket and how to reach them
#[async_trait]
pub trait AssigneeDirectory: Send + Sync {
    /// The first open assignee of a ticket, if any
    async fn find_open_assignee(&self, ticket_id: &TicketId) -> SlaResult<Option<String>>;

    /// Email address of a user, if known
    async fn get_email(&self, user_id: &str) -> SlaResult<Option<String>>;
}

/// Outbound mail delivery. Fire-and-forget: no receipt is consumed.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> SlaResult<()>;
}

/// A message handed to the mail transport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMail {
    /// A message to a single recipient
    pub fn to(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipients: vec![recipient.into()],
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Fetch a ticket's tracking record, creating it if absent.
///
/// Creation relies on the store's insert-if-absent primitive; losing a
/// creation race resolves to the record the winner created.
pub async fn find_or_create_record(
    store: &dyn TrackingStore,
    ticket_id: &TicketId,
    now: DateTime<Utc>,
) -> SlaResult<SlaTrackingRecord> {
    if let Some(record) = store.find_record(ticket_id).await? {
        return Ok(record);
    }

    match store.create_record(ticket_id, now).await {
        Ok(record) => {
            tracing::debug!(ticket_id = %ticket_id, "Created SLA tracking record");
            Ok(record)
        }
        Err(e) if e.is_conflict() => store.find_record(ticket_id).await?.ok_or_else(|| {
            SlaError::Storage(format!(
                "tracking record for {} conflicted on create but could not be read",
                ticket_id
            ))
        }),
        Err(e) => Err(e),
    }
}
