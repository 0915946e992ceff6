//! Notification messages for crossed milestones

use crate::{Milestone, SlaDimension, TicketId};
use serde::{Deserialize, Serialize};

/// A rendered SLA alert, ready to hand to a mail transport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaNotification {
    pub ticket_id: TicketId,
    pub dimension: SlaDimension,
    pub milestone: Milestone,
    pub subject: String,
    pub body: String,
}

impl SlaNotification {
    /// Render the alert for one crossed milestone.
    ///
    /// The 100% milestone uses breach wording rather than a percentage.
    pub fn render(ticket_id: &TicketId, dimension: SlaDimension, milestone: Milestone) -> Self {
        let subject = format!(
            "{} Alert ({}%) - Ticket {}",
            dimension.title(),
            milestone.percent(),
            ticket_id
        );

        let body = if milestone.is_breach() {
            format!(
                "All {} time for ticket {} has passed.\n\nImmediate action is required.",
                dimension.label(),
                ticket_id
            )
        } else {
            format!(
                "{}% of {} time has passed for ticket {}.",
                milestone.percent(),
                dimension.label(),
                ticket_id
            )
        };

        Self {
            ticket_id: ticket_id.clone(),
            dimension,
            milestone,
            subject,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message() {
        let n = SlaNotification::render(
            &TicketId::new("HD-42"),
            SlaDimension::FirstResponse,
            Milestone::ThreeQuarters,
        );
        assert_eq!(n.subject, "First Response SLA Alert (75%) - Ticket HD-42");
        assert_eq!(n.body, "75% of first response time has passed for ticket HD-42.");
    }

    #[test]
    fn test_breach_message() {
        let n = SlaNotification::render(
            &TicketId::new("HD-42"),
            SlaDimension::Resolution,
            Milestone::Breached,
        );
        assert_eq!(n.subject, "Resolution SLA Alert (100%) - Ticket HD-42");
        assert!(n.body.starts_with("All resolution time for ticket HD-42 has passed."));
        assert!(n.body.contains("Immediate action is required."));
        assert!(!n.body.contains("100%"));
    }
}
