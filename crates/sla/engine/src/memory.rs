//! In-memory collaborators for development and testing.
//!
//! Every trait in [`crate::ports`] has an implementation here. They back the
//! daemon's `memory` storage mode and the engine's own tests. Not suitable
//! for production use: nothing survives a restart.

use crate::ports::{AssigneeDirectory, MailTransport, OutboundMail, TicketStore, TrackingStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sla_types::{SlaError, SlaResult, SlaTrackingRecord, Ticket, TicketId, TicketStatus};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

// ── Tickets ─────────────────────────────────────────────────────────

/// Ticket store backed by a map
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a ticket
    pub async fn insert(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id.clone(), ticket);
    }

    /// Replace a ticket, as the helpdesk would after an agent edit
    pub async fn update(&self, ticket: Ticket) {
        self.insert(ticket).await;
    }

    pub async fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.tickets.read().await.get(id).cloned()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn list_by_status(&self, statuses: &[TicketStatus]) -> SlaResult<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut matching: Vec<Ticket> = tickets
            .values()
            .filter(|t| statuses.contains(&t.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }

    async fn get_ticket(&self, id: &TicketId) -> SlaResult<Option<Ticket>> {
        Ok(self.ticket(id).await)
    }

    async fn set_status(&self, id: &TicketId, status: TicketStatus) -> SlaResult<()> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(id)
            .ok_or_else(|| SlaError::TicketNotFound(id.clone()))?;
        ticket.status = status;
        Ok(())
    }
}

// ── Tracking records ────────────────────────────────────────────────

/// Tracking store backed by a map keyed by ticket id
#[derive(Default)]
pub struct InMemoryTrackingStore {
    records: RwLock<HashMap<TicketId, SlaTrackingRecord>>,
    failing_saves: RwLock<HashSet<TicketId>>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Make every save for `ticket_id` fail with a storage error
    pub async fn fail_saves_for(&self, ticket_id: impl Into<TicketId>) {
        self.failing_saves.write().await.insert(ticket_id.into());
    }
}

#[async_trait]
impl TrackingStore for InMemoryTrackingStore {
    async fn find_record(&self, ticket_id: &TicketId) -> SlaResult<Option<SlaTrackingRecord>> {
        Ok(self.records.read().await.get(ticket_id).cloned())
    }

    async fn create_record(
        &self,
        ticket_id: &TicketId,
        now: DateTime<Utc>,
    ) -> SlaResult<SlaTrackingRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(ticket_id) {
            return Err(SlaError::RecordConflict(ticket_id.clone()));
        }
        let record = SlaTrackingRecord::new(ticket_id.clone(), now);
        records.insert(ticket_id.clone(), record.clone());
        Ok(record)
    }

    async fn save_record(&self, record: &SlaTrackingRecord) -> SlaResult<()> {
        if self.failing_saves.read().await.contains(&record.ticket_id) {
            return Err(SlaError::Storage(format!(
                "save rejected for {}",
                record.ticket_id
            )));
        }

        let mut records = self.records.write().await;
        let mut merged = record.clone();
        if let Some(stored) = records.get(&record.ticket_id) {
            merged.merge_from(stored);
        }
        records.insert(record.ticket_id.clone(), merged);
        Ok(())
    }
}

// ── Assignees ───────────────────────────────────────────────────────

/// Assignee directory backed by maps. Assignments keep insertion order and
/// the earliest one is the "first found" assignee.
#[derive(Default)]
pub struct InMemoryDirectory {
    assignments: RwLock<HashMap<TicketId, Vec<String>>>,
    emails: RwLock<HashMap<String, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open assignment of `user_id` to `ticket_id`
    pub async fn assign(&self, ticket_id: impl Into<TicketId>, user_id: impl Into<String>) {
        self.assignments
            .write()
            .await
            .entry(ticket_id.into())
            .or_default()
            .push(user_id.into());
    }

    /// Close every assignment on a ticket
    pub async fn unassign_all(&self, ticket_id: &TicketId) {
        self.assignments.write().await.remove(ticket_id);
    }

    pub async fn set_email(&self, user_id: impl Into<String>, email: impl Into<String>) {
        self.emails
            .write()
            .await
            .insert(user_id.into(), email.into());
    }
}

#[async_trait]
impl AssigneeDirectory for InMemoryDirectory {
    async fn find_open_assignee(&self, ticket_id: &TicketId) -> SlaResult<Option<String>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(ticket_id)
            .and_then(|users| users.first().cloned()))
    }

    async fn get_email(&self, user_id: &str) -> SlaResult<Option<String>> {
        Ok(self.emails.read().await.get(user_id).cloned())
    }
}

// ── Mail ────────────────────────────────────────────────────────────

/// Mail transport that keeps every delivered message in memory
#[derive(Default)]
pub struct RecordingMailTransport {
    sent: RwLock<Vec<OutboundMail>>,
    failing: AtomicBool,
    failing_recipients: RwLock<HashSet<String>>,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first
    pub async fn sent(&self) -> Vec<OutboundMail> {
        self.sent.read().await.clone()
    }

    /// Reject every message while set
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reject messages addressed to `recipient`
    pub async fn fail_recipient(&self, recipient: impl Into<String>) {
        self.failing_recipients
            .write()
            .await
            .insert(recipient.into());
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, mail: &OutboundMail) -> SlaResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SlaError::Transport("mail relay unavailable".into()));
        }
        {
            let blocked = self.failing_recipients.read().await;
            if let Some(recipient) = mail.recipients.iter().find(|r| blocked.contains(*r)) {
                return Err(SlaError::Transport(format!("mailbox {} rejected", recipient)));
            }
        }
        self.sent.write().await.push(mail.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sla_types::{Milestone, SlaDimension};

    #[tokio::test]
    async fn test_list_by_status_is_sorted_and_filtered() {
        let store = InMemoryTicketStore::new();
        let now = Utc::now();
        store.insert(Ticket::new("HD-3", now)).await;
        store
            .insert(Ticket::new("HD-1", now).with_status(TicketStatus::InProgress))
            .await;
        store.insert(Ticket::new("HD-2", now)).await;
        store.insert(Ticket::new("HD-4", now).resolved_at(now)).await;

        let open = store
            .list_by_status(&[TicketStatus::Open, TicketStatus::InProgress])
            .await
            .unwrap();
        let ids: Vec<&str> = open.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["HD-1", "HD-2", "HD-3"]);
    }

    #[tokio::test]
    async fn test_set_status_unknown_ticket() {
        let store = InMemoryTicketStore::new();
        let err = store
            .set_status(&TicketId::new("HD-404"), TicketStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, SlaError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_conflicts_on_second_insert() {
        let store = InMemoryTrackingStore::new();
        let id = TicketId::new("HD-1");
        store.create_record(&id, Utc::now()).await.unwrap();
        let err = store.create_record(&id, Utc::now()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_stale_save_cannot_clear_flags() {
        let store = InMemoryTrackingStore::new();
        let id = TicketId::new("HD-1");
        let now = Utc::now();
        let stale = store.create_record(&id, now).await.unwrap();

        let mut fresh = stale.clone();
        fresh.mark_notified(SlaDimension::FirstResponse, Milestone::Half);
        fresh.record_first_response(now);
        store.save_record(&fresh).await.unwrap();

        store.save_record(&stale).await.unwrap();
        let stored = store.find_record(&id).await.unwrap().unwrap();
        assert!(stored.is_notified(SlaDimension::FirstResponse, Milestone::Half));
        assert_eq!(stored.first_responded_on, Some(now));
    }

    #[tokio::test]
    async fn test_first_assignment_wins() {
        let directory = InMemoryDirectory::new();
        directory.assign("HD-1", "alice").await;
        directory.assign("HD-1", "bob").await;
        assert_eq!(
            directory
                .find_open_assignee(&TicketId::new("HD-1"))
                .await
                .unwrap(),
            Some("alice".to_string())
        );

        directory.unassign_all(&TicketId::new("HD-1")).await;
        assert!(directory
            .find_open_assignee(&TicketId::new("HD-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_recording_transport_failure_modes() {
        let mail = RecordingMailTransport::new();
        mail.fail_recipient("bad@example.com").await;

        let good = OutboundMail::to("ok@example.com", "s", "b");
        let bad = OutboundMail::to("bad@example.com", "s", "b");
        assert!(mail.send(&good).await.is_ok());
        assert!(mail.send(&bad).await.is_err());

        mail.set_failing(true);
        assert!(mail.send(&good).await.is_err());
        assert_eq!(mail.sent().await.len(), 1);
    }
}
