//! Milestone tracker: decides which milestones are newly crossed
//!
//! One tracker exists per SLA dimension. It does not send anything; it
//! flips flags on the tracking record and returns the milestones whose
//! notifications the caller must dispatch once the record is persisted.

use crate::calculator::elapsed_percentage;
use chrono::{DateTime, Utc};
use sla_types::{Milestone, SlaDimension, SlaTrackingRecord, Ticket};

/// Evaluates one SLA dimension of a ticket
#[derive(Clone, Copy, Debug)]
pub struct MilestoneTracker {
    dimension: SlaDimension,
}

impl MilestoneTracker {
    pub fn new(dimension: SlaDimension) -> Self {
        Self { dimension }
    }

    pub fn first_response() -> Self {
        Self::new(SlaDimension::FirstResponse)
    }

    pub fn resolution() -> Self {
        Self::new(SlaDimension::Resolution)
    }

    pub fn dimension(&self) -> SlaDimension {
        self.dimension
    }

    /// Elapsed percentage of this dimension's window at `now`
    pub fn percentage(&self, ticket: &Ticket, now: DateTime<Utc>) -> f64 {
        let (start, due) = self.dimension.window(ticket);
        elapsed_percentage(start, due, now)
    }

    /// Mark every reached-but-unflagged milestone on `record` and return
    /// them in ascending order.
    ///
    /// All skipped milestones are caught up in one pass. A milestone fires
    /// only once it is reached, so a ticket first seen at 90% yields 50 and
    /// 75, and one first seen past its deadline yields 50, 75 and 100.
    /// Nothing is returned once the guarded outcome (reply or resolution)
    /// has happened.
    pub fn evaluate(
        &self,
        ticket: &Ticket,
        record: &mut SlaTrackingRecord,
        now: DateTime<Utc>,
    ) -> Vec<Milestone> {
        if self.dimension.is_settled(ticket) {
            return Vec::new();
        }

        let pct = self.percentage(ticket, now);
        let mut crossed = Vec::new();

        for milestone in Milestone::ALL {
            if !milestone.is_reached_by(pct) {
                continue;
            }
            if record.mark_notified(self.dimension, milestone) {
                crossed.push(milestone);
            }
        }

        if !crossed.is_empty() {
            tracing::debug!(
                ticket_id = %ticket.id,
                dimension = %self.dimension,
                percentage = pct,
                crossed = crossed.len(),
                "SLA milestones crossed"
            );
        }

        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sla_types::TicketId;

    fn open_ticket(t0: DateTime<Utc>) -> Ticket {
        Ticket::new("HD-1", t0)
            .with_response_by(t0 + Duration::minutes(10))
            .with_resolution_by(t0 + Duration::minutes(100))
    }

    fn record() -> SlaTrackingRecord {
        SlaTrackingRecord::new(TicketId::new("HD-1"), Utc::now())
    }

    #[test]
    fn test_below_first_milestone() {
        let t0 = Utc::now();
        let mut rec = record();
        let crossed = MilestoneTracker::first_response().evaluate(
            &open_ticket(t0),
            &mut rec,
            t0 + Duration::minutes(4),
        );
        assert!(crossed.is_empty());
        assert!(rec.first_response.notified().is_empty());
    }

    #[test]
    fn test_catch_up_at_ninety_percent_stops_before_breach() {
        let t0 = Utc::now();
        let mut rec = record();
        let crossed = MilestoneTracker::first_response().evaluate(
            &open_ticket(t0),
            &mut rec,
            t0 + Duration::minutes(9),
        );
        assert_eq!(crossed, vec![Milestone::Half, Milestone::ThreeQuarters]);
        assert!(!rec.first_response.is_notified(Milestone::Breached));
    }

    #[test]
    fn test_catch_up_past_deadline_fires_all_in_order() {
        let t0 = Utc::now();
        let mut rec = record();
        let crossed = MilestoneTracker::first_response().evaluate(
            &open_ticket(t0),
            &mut rec,
            t0 + Duration::minutes(11),
        );
        assert_eq!(
            crossed,
            vec![Milestone::Half, Milestone::ThreeQuarters, Milestone::Breached]
        );
    }

    #[test]
    fn test_already_flagged_is_skipped() {
        let t0 = Utc::now();
        let tracker = MilestoneTracker::first_response();
        let ticket = open_ticket(t0);
        let mut rec = record();

        let first = tracker.evaluate(&ticket, &mut rec, t0 + Duration::minutes(6));
        assert_eq!(first, vec![Milestone::Half]);

        let again = tracker.evaluate(&ticket, &mut rec, t0 + Duration::minutes(7));
        assert!(again.is_empty());

        let later = tracker.evaluate(&ticket, &mut rec, t0 + Duration::minutes(12));
        assert_eq!(later, vec![Milestone::ThreeQuarters, Milestone::Breached]);
    }

    #[test]
    fn test_guard_suppresses_everything() {
        let t0 = Utc::now();
        let ticket = open_ticket(t0).responded_at(t0 + Duration::minutes(1));
        let mut rec = record();
        let crossed = MilestoneTracker::first_response().evaluate(
            &ticket,
            &mut rec,
            t0 + Duration::hours(5),
        );
        assert!(crossed.is_empty());

        // The resolution dimension is unaffected by the reply
        let crossed = MilestoneTracker::resolution().evaluate(
            &ticket,
            &mut rec,
            t0 + Duration::minutes(80),
        );
        assert_eq!(crossed, vec![Milestone::Half, Milestone::ThreeQuarters]);
    }

    #[test]
    fn test_missing_deadline_never_fires() {
        let t0 = Utc::now();
        let ticket = Ticket::new("HD-2", t0);
        let mut rec = record();
        let crossed = MilestoneTracker::resolution().evaluate(
            &ticket,
            &mut rec,
            t0 + Duration::days(30),
        );
        assert!(crossed.is_empty());
    }
}
