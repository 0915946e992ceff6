//! SLA Milestone Engine
//!
//! The engine evaluates support tickets against their first-response and
//! resolution deadlines, fires one notification per crossed milestone
//! (50%, 75%, 100%), captures write-once timestamps, and auto-closes
//! resolved tickets after a grace period.
//!
//! # Key Principle
//!
//! **Every state change is monotonic.** Milestone flags only move from
//! unset to set and captured timestamps are never overwritten, so an
//! interrupted cycle is safely resumed by the next one.
//!
//! # Architecture
//!
//! The [`SlaOrchestrator`] composes specialized components:
//!
//! - [`calculator`]: Converts a deadline window into an elapsed percentage
//! - [`MilestoneTracker`]: Decides which milestones are newly crossed
//! - [`TimestampRecorder`]: Captures first-response and resolution times
//! - [`NotificationDispatcher`]: Resolves the assignee and sends the alert
//! - [`LifecycleCloser`]: Moves resolved tickets to closed after a grace period
//!
//! Everything outside the engine (ticket database, tracking persistence,
//! user directory, mail) is reached through the traits in [`ports`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use sla_engine::memory::*;
//! use sla_engine::{EngineConfig, SlaOrchestrator};
//! use sla_types::*;
//!
//! # tokio_test_block(async {
//! let t0 = Utc::now();
//! let tickets = Arc::new(InMemoryTicketStore::new());
//! tickets
//!     .insert(Ticket::new("HD-1", t0).with_response_by(t0 + Duration::minutes(10)))
//!     .await;
//!
//! let directory = Arc::new(InMemoryDirectory::new());
//! directory.assign("HD-1", "agent").await;
//! directory.set_email("agent", "agent@example.com").await;
//!
//! let mail = Arc::new(RecordingMailTransport::new());
//! let orchestrator = SlaOrchestrator::new(
//!     tickets,
//!     Arc::new(InMemoryTrackingStore::new()),
//!     directory,
//!     mail.clone(),
//!     EngineConfig::default(),
//! );
//!
//! let report = orchestrator.run_cycle(t0 + Duration::minutes(6)).await;
//! assert_eq!(report.sent_count(), 1);
//! assert_eq!(mail.sent().await[0].subject, "First Response SLA Alert (50%) - Ticket HD-1");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]

pub mod calculator;
pub mod closer;
pub mod dispatcher;
pub mod memory;
pub mod orchestrator;
pub mod ports;
pub mod recorder;
pub mod report;
pub mod tracker;

// Re-export main types
pub use calculator::elapsed_percentage;
pub use closer::LifecycleCloser;
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use orchestrator::{EngineConfig, SlaOrchestrator};
pub use ports::{
    find_or_create_record, AssigneeDirectory, MailTransport, OutboundMail, TicketStore,
    TrackingStore,
};
pub use recorder::{RecordedTimestamps, TimestampRecorder};
pub use report::{CycleFailure, CyclePhase, CycleReport, NotificationOutcome, NotificationRecord};
pub use tracker::MilestoneTracker;
