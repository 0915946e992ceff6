//! Timestamp recorder: write-once capture of response and resolution times
//!
//! The first-response timestamp is sampled: it records the evaluation time
//! at which the ticket was first *observed* In-Progress, not the instant the
//! reply was sent. Its precision is the scheduler interval. There is no
//! reply event to hook, so this is the best the periodic scan can do.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sla_types::{SlaTrackingRecord, Ticket, TicketStatus};

/// What a recorder pass changed on a record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordedTimestamps {
    pub first_response: bool,
    pub resolution: bool,
}

impl RecordedTimestamps {
    /// Whether the record changed and needs to be persisted
    pub fn any(&self) -> bool {
        self.first_response || self.resolution
    }
}

/// Captures timestamps onto tracking records
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampRecorder;

impl TimestampRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Set `first_responded_on` to `now` if the ticket is In-Progress and
    /// nothing has been recorded yet
    pub fn record_first_response(
        &self,
        ticket: &Ticket,
        record: &mut SlaTrackingRecord,
        now: DateTime<Utc>,
    ) -> bool {
        ticket.status == TicketStatus::InProgress && record.record_first_response(now)
    }

    /// Copy the ticket's resolution date if it has one and nothing has been
    /// recorded yet
    pub fn record_resolution(&self, ticket: &Ticket, record: &mut SlaTrackingRecord) -> bool {
        match ticket.resolution_date {
            Some(date) => record.record_resolution(date),
            None => false,
        }
    }

    /// Run both captures
    pub fn apply(
        &self,
        ticket: &Ticket,
        record: &mut SlaTrackingRecord,
        now: DateTime<Utc>,
    ) -> RecordedTimestamps {
        RecordedTimestamps {
            first_response: self.record_first_response(ticket, record, now),
            resolution: self.record_resolution(ticket, record),
        }
    }
}
