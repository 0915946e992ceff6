//! Lifecycle closer: moves resolved tickets to Closed after a grace period

use crate::ports::TicketStore;
use chrono::{DateTime, Duration, Utc};
use sla_types::{SlaError, SlaResult, Ticket, TicketStatus};

/// Auto-closes resolved tickets once their grace period has passed
#[derive(Clone, Copy, Debug)]
pub struct LifecycleCloser {
    grace_period: Duration,
}

impl LifecycleCloser {
    /// Two days
    pub const DEFAULT_GRACE_SECS: i64 = 172_800;

    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Whether `ticket` is Resolved and `resolution_date + grace <= now`.
    /// A resolved ticket with no resolution date is never due, nor is one
    /// whose close date lies beyond the representable calendar.
    pub fn is_due(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        if ticket.status != TicketStatus::Resolved {
            return false;
        }
        ticket
            .resolution_date
            .and_then(|resolved| resolved.checked_add_signed(self.grace_period))
            .is_some_and(|due| due <= now)
    }

    /// Close `ticket` if it is due. Returns whether a transition was made.
    pub async fn close_if_due(
        &self,
        store: &dyn TicketStore,
        ticket: &Ticket,
        now: DateTime<Utc>,
    ) -> SlaResult<bool> {
        if !self.is_due(ticket, now) {
            return Ok(false);
        }

        if !ticket.status.can_transition_to(TicketStatus::Closed) {
            return Err(SlaError::InvalidTransition {
                from: ticket.status,
                to: TicketStatus::Closed,
            });
        }

        store.set_status(&ticket.id, TicketStatus::Closed).await?;
        tracing::info!(ticket_id = %ticket.id, "Closed resolved ticket after grace period");
        Ok(true)
    }
}

impl Default for LifecycleCloser {
    fn default() -> Self {
        Self::new(Duration::seconds(Self::DEFAULT_GRACE_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTicketStore;

    #[test]
    fn test_grace_boundary() {
        let t = Utc::now();
        let closer = LifecycleCloser::default();
        let ticket = Ticket::new("HD-1", t - Duration::days(1)).resolved_at(t);

        assert!(!closer.is_due(&ticket, t + Duration::hours(47)));
        assert!(closer.is_due(&ticket, t + Duration::hours(48)));
        assert!(closer.is_due(&ticket, t + Duration::hours(49)));
    }

    #[test]
    fn test_huge_grace_period_is_never_due() {
        let t = Utc::now();
        let closer = LifecycleCloser::new(Duration::seconds(i64::MAX / 1000));
        let ticket = Ticket::new("HD-6", t).resolved_at(t);

        assert!(!closer.is_due(&ticket, t + Duration::days(365 * 1000)));
    }

    #[test]
    fn test_only_resolved_tickets_are_due() {
        let t = Utc::now();
        let closer = LifecycleCloser::default();
        let later = t + Duration::days(10);

        let open = Ticket::new("HD-2", t);
        assert!(!closer.is_due(&open, later));

        let closed = Ticket::new("HD-3", t)
            .resolved_at(t)
            .with_status(TicketStatus::Closed);
        assert!(!closer.is_due(&closed, later));

        let no_date = Ticket::new("HD-4", t).with_status(TicketStatus::Resolved);
        assert!(!closer.is_due(&no_date, later));
    }

    #[tokio::test]
    async fn test_close_if_due_updates_store() {
        let t = Utc::now();
        let store = InMemoryTicketStore::new();
        let ticket = Ticket::new("HD-5", t).resolved_at(t);
        store.insert(ticket.clone()).await;

        let closer = LifecycleCloser::new(Duration::hours(1));
        assert!(!closer.close_if_due(&store, &ticket, t).await.unwrap());
        assert!(closer
            .close_if_due(&store, &ticket, t + Duration::hours(2))
            .await
            .unwrap());

        let stored = store.ticket(&ticket.id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Closed);
    }
}
