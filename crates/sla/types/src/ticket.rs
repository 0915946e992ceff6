//! Tickets: the externally owned entities SLA tracking reads
//!
//! The ticketing store owns and mutates tickets. SLA tracking only reads
//! them, with one exception: the lifecycle closer moves resolved tickets
//! to closed once their grace period has elapsed.

use crate::SlaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ── Ticket Identifier ────────────────────────────────────────────────

/// Unique identifier for a support ticket
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Lifecycle status of a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In-Progress", alias = "InProgress", alias = "in_progress")]
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Every status, in lifecycle order
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In-Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Lower-case spellings accepted when parsing, canonical first
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            TicketStatus::Open => &["open"],
            TicketStatus::InProgress => &["in-progress", "in progress", "in_progress", "inprogress"],
            TicketStatus::Resolved => &["resolved"],
            TicketStatus::Closed => &["closed"],
        }
    }

    /// Aggregate category of this status
    pub fn category(&self) -> StatusCategory {
        match self {
            TicketStatus::Open | TicketStatus::InProgress => StatusCategory::Open,
            TicketStatus::Resolved | TicketStatus::Closed => StatusCategory::Closed,
        }
    }

    /// Whether the ticketing workflow permits moving from `self` to `next`.
    ///
    /// Closed is terminal. Resolved tickets may be reopened by agents, but
    /// nothing in SLA tracking ever reopens a ticket.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (*self, next) {
            (Closed, _) => false,
            (a, b) if a == b => false,
            (Open, _) | (InProgress, _) => true,
            (Resolved, Closed) | (Resolved, Open) | (Resolved, InProgress) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.spellings().contains(&key.as_str()))
            .ok_or_else(|| SlaError::UnknownStatus(s.to_string()))
    }
}

/// Coarse open/closed grouping of ticket statuses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Open,
    Closed,
}

// ── Ticket ───────────────────────────────────────────────────────────

/// A support ticket as seen by SLA tracking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier
    pub id: TicketId,
    /// Current lifecycle status
    pub status: TicketStatus,
    /// When the ticket was created; the start of both SLA windows
    pub creation: DateTime<Utc>,
    /// First-response deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_by: Option<DateTime<Utc>>,
    /// Resolution deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_by: Option<DateTime<Utc>>,
    /// Seconds from creation to the first reply, set once a reply is sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_response_time: Option<f64>,
    /// Seconds from creation to resolution, set once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_time: Option<f64>,
    /// When the ticket was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create an open ticket with no deadlines
    pub fn new(id: impl Into<TicketId>, creation: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: TicketStatus::Open,
            creation,
            response_by: None,
            resolution_by: None,
            first_response_time: None,
            resolution_time: None,
            resolution_date: None,
        }
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_response_by(mut self, due: DateTime<Utc>) -> Self {
        self.response_by = Some(due);
        self
    }

    pub fn with_resolution_by(mut self, due: DateTime<Utc>) -> Self {
        self.resolution_by = Some(due);
        self
    }

    /// Mark the first reply as sent at `at`
    pub fn responded_at(mut self, at: DateTime<Utc>) -> Self {
        self.first_response_time = Some(seconds_between(self.creation, at));
        self
    }

    /// Mark the ticket resolved at `at`
    pub fn resolved_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = TicketStatus::Resolved;
        self.resolution_time = Some(seconds_between(self.creation, at));
        self.resolution_date = Some(at);
        self
    }

    pub fn has_responded(&self) -> bool {
        self.first_response_time.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution_time.is_some()
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
