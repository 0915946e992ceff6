//! SLA dimensions and notification milestones
//!
//! Each ticket is tracked along two independent dimensions. Along each,
//! three milestones fire as the elapsed share of the SLA window grows.

use crate::Ticket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Dimension ────────────────────────────────────────────────────────

/// Which SLA deadline is being tracked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaDimension {
    /// Deadline for the first reply to the customer
    FirstResponse,
    /// Deadline for resolving the ticket
    Resolution,
}

impl SlaDimension {
    /// Lower-case label used in message bodies
    pub fn label(&self) -> &'static str {
        match self {
            SlaDimension::FirstResponse => "first response",
            SlaDimension::Resolution => "resolution",
        }
    }

    /// Title used in message subjects
    pub fn title(&self) -> &'static str {
        match self {
            SlaDimension::FirstResponse => "First Response SLA",
            SlaDimension::Resolution => "Resolution SLA",
        }
    }

    /// The `(start, due)` window this dimension measures on a ticket
    pub fn window(&self, ticket: &Ticket) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            SlaDimension::FirstResponse => (Some(ticket.creation), ticket.response_by),
            SlaDimension::Resolution => (Some(ticket.creation), ticket.resolution_by),
        }
    }

    /// Whether the outcome this dimension guards has already happened.
    ///
    /// Once a ticket has been answered (or resolved) the corresponding
    /// deadline no longer applies.
    pub fn is_settled(&self, ticket: &Ticket) -> bool {
        match self {
            SlaDimension::FirstResponse => ticket.has_responded(),
            SlaDimension::Resolution => ticket.is_resolved(),
        }
    }
}

impl std::fmt::Display for SlaDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Milestone ────────────────────────────────────────────────────────

/// A notification threshold on elapsed SLA time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    /// 50% of the window has elapsed
    #[serde(rename = "50")]
    Half,
    /// 75% of the window has elapsed
    #[serde(rename = "75")]
    ThreeQuarters,
    /// The deadline has passed
    #[serde(rename = "100")]
    Breached,
}

impl Milestone {
    /// All milestones in ascending order
    pub const ALL: [Milestone; 3] = [Milestone::Half, Milestone::ThreeQuarters, Milestone::Breached];

    pub fn percent(&self) -> u8 {
        match self {
            Milestone::Half => 50,
            Milestone::ThreeQuarters => 75,
            Milestone::Breached => 100,
        }
    }

    /// Whether an elapsed percentage has reached this milestone
    pub fn is_reached_by(&self, percentage: f64) -> bool {
        percentage >= f64::from(self.percent())
    }

    /// The terminal milestone gets a distinct breach message
    pub fn is_breach(&self) -> bool {
        matches!(self, Milestone::Breached)
    }

    fn index(&self) -> usize {
        match self {
            Milestone::Half => 0,
            Milestone::ThreeQuarters => 1,
            Milestone::Breached => 2,
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

// ── Flags ────────────────────────────────────────────────────────────

/// Which milestones of one dimension have already been notified.
///
/// Flags are monotonic: there is no way to clear one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneFlags([bool; 3]);

impl MilestoneFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the three stored booleans (50, 75, 100)
    pub fn from_bits(half: bool, three_quarters: bool, breached: bool) -> Self {
        Self([half, three_quarters, breached])
    }

    pub fn is_notified(&self, milestone: Milestone) -> bool {
        self.0[milestone.index()]
    }

    /// Set the flag for `milestone`. Returns true if it was newly set.
    pub fn mark(&mut self, milestone: Milestone) -> bool {
        let slot = &mut self.0[milestone.index()];
        let newly = !*slot;
        *slot = true;
        newly
    }

    /// Union with another flag set; used when merging concurrent writers
    pub fn merge(&mut self, other: &MilestoneFlags) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine |= *theirs;
        }
    }

    /// Milestones already notified, ascending
    pub fn notified(&self) -> Vec<Milestone> {
        Milestone::ALL
            .into_iter()
            .filter(|m| self.is_notified(*m))
            .collect()
    }

    pub fn bits(&self) -> [bool; 3] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_milestone_order_and_percent() {
        let percents: Vec<u8> = Milestone::ALL.iter().map(|m| m.percent()).collect();
        assert_eq!(percents, vec![50, 75, 100]);
        assert!(Milestone::Half < Milestone::Breached);
    }

    #[test]
    fn test_reached_by() {
        assert!(Milestone::Half.is_reached_by(50.0));
        assert!(!Milestone::Half.is_reached_by(49.999));
        assert!(Milestone::Breached.is_reached_by(100.0));
        assert!(!Milestone::Half.is_reached_by(-20.0));
    }

    #[test]
    fn test_flags_are_monotonic() {
        let mut flags = MilestoneFlags::new();
        assert!(flags.mark(Milestone::ThreeQuarters));
        assert!(!flags.mark(Milestone::ThreeQuarters));
        assert!(flags.is_notified(Milestone::ThreeQuarters));
        assert!(!flags.is_notified(Milestone::Half));
        assert_eq!(flags.notified(), vec![Milestone::ThreeQuarters]);

        let mut other = MilestoneFlags::from_bits(true, false, false);
        other.merge(&flags);
        assert_eq!(other.bits(), [true, true, false]);
    }

    #[test]
    fn test_dimension_window_and_guard() {
        let t0 = Utc::now();
        let ticket = Ticket::new("HD-1", t0)
            .with_response_by(t0 + Duration::hours(1))
            .with_resolution_by(t0 + Duration::hours(8));

        assert_eq!(
            SlaDimension::FirstResponse.window(&ticket),
            (Some(t0), Some(t0 + Duration::hours(1)))
        );
        assert_eq!(
            SlaDimension::Resolution.window(&ticket),
            (Some(t0), Some(t0 + Duration::hours(8)))
        );
        assert!(!SlaDimension::FirstResponse.is_settled(&ticket));

        let answered = ticket.responded_at(t0 + Duration::minutes(5));
        assert!(SlaDimension::FirstResponse.is_settled(&answered));
        assert!(!SlaDimension::Resolution.is_settled(&answered));
    }

    #[test]
    fn test_milestone_serde() {
        let json = serde_json::to_string(&Milestone::Breached).unwrap();
        assert_eq!(json, "\"100\"");
        let json = serde_json::to_string(&SlaDimension::FirstResponse).unwrap();
        assert_eq!(json, "\"first_response\"");
    }
}
