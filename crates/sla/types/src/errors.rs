//! Error types for SLA tracking

use crate::{TicketId, TicketStatus};

/// Errors that can occur while evaluating or persisting SLA state
#[derive(Debug, thiserror::Error)]
pub enum SlaError {
    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("Tracking record already exists for ticket: {0}")]
    RecordConflict(TicketId),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error("Unknown ticket status: {0}")]
    UnknownStatus(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SlaError {
    /// Whether this error is a creation conflict on the tracking store
    pub fn is_conflict(&self) -> bool {
        matches!(self, SlaError::RecordConflict(_))
    }
}

/// Result type alias for SLA operations
pub type SlaResult<T> = Result<T, SlaError>;
