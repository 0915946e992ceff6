//! SLA Daemon library
//!
//! This module provides the core components for the SLA daemon:
//! - REST API handlers
//! - PostgreSQL storage adapters and mail transports
//! - Scheduler
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod mail;
pub mod scheduler;
pub mod server;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use scheduler::Scheduler;
pub use server::Server;
