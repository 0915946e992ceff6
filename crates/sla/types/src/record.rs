//! Per-ticket SLA tracking record
//!
//! One record exists per ticket. It is created lazily the first time a
//! ticket is evaluated and keeps the write-once timestamps and the
//! monotonic milestone flags for both dimensions.

use crate::{Milestone, MilestoneFlags, SlaDimension, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracking state for one ticket
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaTrackingRecord {
    /// The ticket this record belongs to (unique)
    pub ticket_id: TicketId,
    /// When the ticket was first observed In-Progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_responded_on: Option<DateTime<Utc>>,
    /// Resolution date copied from the ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<DateTime<Utc>>,
    /// First-response milestones already notified
    #[serde(default)]
    pub first_response: MilestoneFlags,
    /// Resolution milestones already notified
    #[serde(default)]
    pub resolution: MilestoneFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlaTrackingRecord {
    pub fn new(ticket_id: TicketId, now: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            first_responded_on: None,
            resolution_date: None,
            first_response: MilestoneFlags::new(),
            resolution: MilestoneFlags::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn flags(&self, dimension: SlaDimension) -> &MilestoneFlags {
        match dimension {
            SlaDimension::FirstResponse => &self.first_response,
            SlaDimension::Resolution => &self.resolution,
        }
    }

    fn flags_mut(&mut self, dimension: SlaDimension) -> &mut MilestoneFlags {
        match dimension {
            SlaDimension::FirstResponse => &mut self.first_response,
            SlaDimension::Resolution => &mut self.resolution,
        }
    }

    pub fn is_notified(&self, dimension: SlaDimension, milestone: Milestone) -> bool {
        self.flags(dimension).is_notified(milestone)
    }

    /// Mark a milestone as notified. Returns true if it was newly set.
    pub fn mark_notified(&mut self, dimension: SlaDimension, milestone: Milestone) -> bool {
        self.flags_mut(dimension).mark(milestone)
    }

    /// Capture the first In-Progress observation. No-op once set.
    pub fn record_first_response(&mut self, at: DateTime<Utc>) -> bool {
        if self.first_responded_on.is_some() {
            return false;
        }
        self.first_responded_on = Some(at);
        true
    }

    /// Capture the resolution date. No-op once set.
    pub fn record_resolution(&mut self, date: DateTime<Utc>) -> bool {
        if self.resolution_date.is_some() {
            return false;
        }
        self.resolution_date = Some(date);
        true
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Fold in state another writer has already persisted.
    ///
    /// Flags are unioned and timestamps keep whichever value was written
    /// first, so merging can never undo a write.
    pub fn merge_from(&mut self, stored: &SlaTrackingRecord) {
        self.first_response.merge(&stored.first_response);
        self.resolution.merge(&stored.resolution);
        if stored.first_responded_on.is_some() {
            self.first_responded_on = stored.first_responded_on;
        }
        if stored.resolution_date.is_some() {
            self.resolution_date = stored.resolution_date;
        }
        self.created_at = self.created_at.min(stored.created_at);
        self.updated_at = self.updated_at.max(stored.updated_at);
    }
}
