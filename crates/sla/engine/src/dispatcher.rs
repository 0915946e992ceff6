//! Notification dispatcher: resolves the assignee and hands the alert to
//! the mail transport
//!
//! A ticket without an open assignee, or an assignee without an email
//! address, is not an error. The alert is simply dropped and the outcome
//! says why. Delivery failures are returned to the caller and never retried
//! here.

use crate::ports::{AssigneeDirectory, MailTransport, OutboundMail};
use serde::{Deserialize, Serialize};
use sla_types::{Milestone, SlaDimension, SlaNotification, SlaResult, Ticket};
use std::sync::Arc;

/// What happened to one dispatched alert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Handed to the mail transport
    Sent { recipient: String },
    /// The ticket has no open assignee
    NoAssignee,
    /// The assignee has no usable email address
    NoEmail { assignee: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

/// Sends SLA alerts to a ticket's assignee
#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn AssigneeDirectory>,
    transport: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(directory: Arc<dyn AssigneeDirectory>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            directory,
            transport,
        }
    }

    /// Alert the assignee of `ticket` that `milestone` of `dimension` has
    /// been crossed.
    ///
    /// Callers invoke this at most once per newly crossed milestone.
    pub async fn notify(
        &self,
        ticket: &Ticket,
        dimension: SlaDimension,
        milestone: Milestone,
    ) -> SlaResult<DispatchOutcome> {
        let assignee = match self.directory.find_open_assignee(&ticket.id).await? {
            Some(assignee) => assignee,
            None => {
                tracing::debug!(
                    ticket_id = %ticket.id,
                    dimension = %dimension,
                    milestone = %milestone,
                    "No open assignee, skipping SLA alert"
                );
                return Ok(DispatchOutcome::NoAssignee);
            }
        };

        let email = match self.directory.get_email(&assignee).await? {
            Some(email) if !email.trim().is_empty() => email,
            _ => {
                tracing::debug!(
                    ticket_id = %ticket.id,
                    assignee = %assignee,
                    "Assignee has no email, skipping SLA alert"
                );
                return Ok(DispatchOutcome::NoEmail { assignee });
            }
        };

        let notification = SlaNotification::render(&ticket.id, dimension, milestone);
        let mail = OutboundMail::to(email.clone(), notification.subject, notification.body);
        self.transport.send(&mail).await?;

        tracing::info!(
            ticket_id = %ticket.id,
            dimension = %dimension,
            milestone = %milestone,
            recipient = %email,
            "SLA alert sent"
        );

        Ok(DispatchOutcome::Sent { recipient: email })
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryDirectory, RecordingMailTransport};
    use chrono::Utc;

    async fn setup() -> (
        NotificationDispatcher,
        Arc<InMemoryDirectory>,
        Arc<RecordingMailTransport>,
    ) {
        let directory = Arc::new(InMemoryDirectory::new());
        let mail = Arc::new(RecordingMailTransport::new());
        let dispatcher = NotificationDispatcher::new(directory.clone(), mail.clone());
        (dispatcher, directory, mail)
    }

    #[tokio::test]
    async fn test_sends_to_first_open_assignee() {
        let (dispatcher, directory, mail) = setup().await;
        directory.assign("HD-1", "alice").await;
        directory.assign("HD-1", "bob").await;
        directory.set_email("alice", "alice@example.com").await;
        directory.set_email("bob", "bob@example.com").await;

        let ticket = Ticket::new("HD-1", Utc::now());
        let outcome = dispatcher
            .notify(&ticket, SlaDimension::FirstResponse, Milestone::Half)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Sent {
                recipient: "alice@example.com".into()
            }
        );
        let sent = mail.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["alice@example.com".to_string()]);
        assert_eq!(sent[0].subject, "First Response SLA Alert (50%) - Ticket HD-1");
    }

    #[tokio::test]
    async fn test_missing_assignee_is_noop() {
        let (dispatcher, _directory, mail) = setup().await;
        let ticket = Ticket::new("HD-2", Utc::now());
        let outcome = dispatcher
            .notify(&ticket, SlaDimension::Resolution, Milestone::Breached)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoAssignee);
        assert!(mail.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_email_is_noop() {
        let (dispatcher, directory, mail) = setup().await;
        directory.assign("HD-3", "carol").await;
        let ticket = Ticket::new("HD-3", Utc::now());
        let outcome = dispatcher
            .notify(&ticket, SlaDimension::Resolution, Milestone::Half)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::NoEmail {
                assignee: "carol".into()
            }
        );
        assert!(mail.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let (dispatcher, directory, mail) = setup().await;
        directory.assign("HD-4", "dave").await;
        directory.set_email("dave", "dave@example.com").await;
        mail.set_failing(true);

        let ticket = Ticket::new("HD-4", Utc::now());
        let result = dispatcher
            .notify(&ticket, SlaDimension::FirstResponse, Milestone::Breached)
            .await;
        assert!(result.is_err());
    }
}
