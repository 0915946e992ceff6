//! Scheduler
//!
//! The scheduler is responsible for:
//! - Running an SLA cycle every configured interval
//! - Running extra cycles on request
//! - Skipping ticks that would overlap a running cycle

mod runner;

pub use runner::{Scheduler, TriggerStatus};
