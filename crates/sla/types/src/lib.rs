//! SLA Domain Types
//!
//! Support tickets carry two service-level deadlines: a first-response
//! deadline and a resolution deadline. This crate holds the vocabulary the
//! milestone engine works with.
//!
//! # Key Concepts
//!
//! - **Ticket**: the externally owned support ticket, read-mostly.
//! - **SlaDimension**: which deadline is being tracked (first response or
//!   resolution).
//! - **Milestone**: a percentage of elapsed SLA time (50, 75, 100) at which
//!   the assignee is notified.
//! - **SlaTrackingRecord**: per-ticket state recording which milestones have
//!   already fired and which timestamps have been captured.
//! - **SlaNotification**: the rendered subject and body for one crossed
//!   milestone.
//!
//! # Invariants
//!
//! 1. Milestone flags only move from unset to set.
//! 2. Captured timestamps are written once and never overwritten.
//! 3. At most one tracking record exists per ticket.

#![deny(unsafe_code)]

mod errors;
mod milestone;
mod notification;
mod record;
mod ticket;

pub use errors::*;
pub use milestone::*;
pub use notification::*;
pub use record::*;
pub use ticket::*;
