//! Cycle report: what one evaluation pass did
//!
//! The orchestrator never returns an error for a cycle. Per-ticket problems
//! are collected here instead and logged as they happen.

use crate::dispatcher::DispatchOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sla_types::{Milestone, SlaDimension, TicketId};

/// The step of a cycle a failure happened in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Timestamps,
    FirstResponse,
    Resolution,
    Close,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Timestamps => "timestamps",
            CyclePhase::FirstResponse => "first_response",
            CyclePhase::Resolution => "resolution",
            CyclePhase::Close => "close",
        }
    }
}

impl From<SlaDimension> for CyclePhase {
    fn from(dimension: SlaDimension) -> Self {
        match dimension {
            SlaDimension::FirstResponse => CyclePhase::FirstResponse,
            SlaDimension::Resolution => CyclePhase::Resolution,
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one notification attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent { recipient: String },
    NoAssignee,
    NoEmail { assignee: String },
    Failed { error: String },
}

impl From<DispatchOutcome> for NotificationOutcome {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Sent { recipient } => NotificationOutcome::Sent { recipient },
            DispatchOutcome::NoAssignee => NotificationOutcome::NoAssignee,
            DispatchOutcome::NoEmail { assignee } => NotificationOutcome::NoEmail { assignee },
        }
    }
}

/// A newly crossed milestone and what became of its alert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub ticket_id: TicketId,
    pub dimension: SlaDimension,
    pub milestone: Milestone,
    pub outcome: NotificationOutcome,
}

/// A failure that was logged and skipped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleFailure {
    /// None when the phase failed before reaching any ticket
    pub ticket_id: Option<TicketId>,
    pub phase: CyclePhase,
    pub error: String,
}

/// Summary of one evaluation cycle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub first_responses_recorded: usize,
    pub resolutions_recorded: usize,
    pub notifications: Vec<NotificationRecord>,
    pub closed: Vec<TicketId>,
    pub failures: Vec<CycleFailure>,
}

impl CycleReport {
    pub fn new(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id: uuid::Uuid::new_v4().to_string(),
            evaluated_at,
            first_responses_recorded: 0,
            resolutions_recorded: 0,
            notifications: Vec::new(),
            closed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of alerts handed to the mail transport
    pub fn sent_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n.outcome, NotificationOutcome::Sent { .. }))
            .count()
    }

    /// No failures of any kind
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && !self
                .notifications
                .iter()
                .any(|n| matches!(n.outcome, NotificationOutcome::Failed { .. }))
    }

    /// Notifications for one ticket, in dispatch order
    pub fn notifications_for(
        &self,
        ticket_id: &TicketId,
    ) -> impl Iterator<Item = &NotificationRecord> + '_ {
        let ticket_id = ticket_id.clone();
        self.notifications
            .iter()
            .filter(move |n| n.ticket_id == ticket_id)
    }

    pub(crate) fn record_failure(
        &mut self,
        ticket_id: Option<&TicketId>,
        phase: CyclePhase,
        error: impl ToString,
    ) {
        let error = error.to_string();
        match ticket_id {
            Some(id) => tracing::error!(ticket_id = %id, phase = %phase, error = %error, "SLA cycle step failed"),
            None => tracing::error!(phase = %phase, error = %error, "SLA cycle phase failed"),
        }
        self.failures.push(CycleFailure {
            ticket_id: ticket_id.cloned(),
            phase,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_cleanliness() {
        let mut report = CycleReport::new(Utc::now());
        assert!(report.is_clean());

        let id = TicketId::new("HD-1");
        report.notifications.push(NotificationRecord {
            ticket_id: id.clone(),
            dimension: SlaDimension::FirstResponse,
            milestone: Milestone::Half,
            outcome: DispatchOutcome::Sent {
                recipient: "a@example.com".into(),
            }
            .into(),
        });
        report.notifications.push(NotificationRecord {
            ticket_id: TicketId::new("HD-2"),
            dimension: SlaDimension::Resolution,
            milestone: Milestone::Breached,
            outcome: NotificationOutcome::Failed {
                error: "relay down".into(),
            },
        });

        assert_eq!(report.sent_count(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.notifications_for(&id).count(), 1);

        // Results outlive a temporary key
        let failed: Vec<&NotificationRecord> = report
            .notifications_for(&TicketId::new("HD-2"))
            .filter(|n| matches!(n.outcome, NotificationOutcome::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].milestone, Milestone::Breached);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(NotificationOutcome::NoEmail {
            assignee: "bob".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "no_email");
        assert_eq!(json["assignee"], "bob");
    }

    #[test]
    fn test_phase_from_dimension() {
        assert_eq!(
            CyclePhase::from(SlaDimension::Resolution),
            CyclePhase::Resolution
        );
        assert_eq!(CyclePhase::FirstResponse.to_string(), "first_response");
    }
}
