//! Periodic cycle runner

use crate::config::{SchedulerConfig, MAX_INTERVAL_SECS};
use crate::error::{DaemonError, DaemonResult};
use chrono::Utc;
use sla_engine::{CycleReport, SlaOrchestrator};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Outcome of a cycle request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerStatus {
    /// A cycle will run as soon as the loop wakes
    Queued,
    /// A request is already pending; this one was folded into it
    AlreadyQueued,
}

impl TriggerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerStatus::Queued => "queued",
            TriggerStatus::AlreadyQueued => "already_queued",
        }
    }
}

/// Scheduler state
pub struct Scheduler {
    config: SchedulerConfig,
    engine: Arc<SlaOrchestrator>,
    trigger_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(
        config: SchedulerConfig,
        engine: Arc<SlaOrchestrator>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let scheduler = Arc::new(Self {
            config,
            engine,
            trigger_tx,
            running: Arc::new(RwLock::new(false)),
        });

        (scheduler, trigger_rx)
    }

    /// Request a cycle as soon as possible. At most one request is held;
    /// requests made while one is pending are folded into it. Fails once
    /// the loop has exited and nothing will ever receive the request.
    pub fn trigger_cycle(&self) -> DaemonResult<TriggerStatus> {
        match self.trigger_tx.try_send(()) {
            Ok(()) => Ok(TriggerStatus::Queued),
            Err(TrySendError::Full(())) => Ok(TriggerStatus::AlreadyQueued),
            Err(TrySendError::Closed(())) => Err(DaemonError::SchedulerStopped),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run the loop until [`Scheduler::stop`] is called
    pub async fn start(self: Arc<Self>, mut trigger_rx: mpsc::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        let secs = self.config.interval_secs.clamp(1, MAX_INTERVAL_SECS);
        let period = Duration::from_secs(secs);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.config.run_on_start {
            ticker.reset();
        }

        tracing::info!(interval_secs = period.as_secs(), "Scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                received = trigger_rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::debug!("Triggered SLA cycle");
                }
            }

            if !self.is_running().await {
                break;
            }

            self.run_once().await;
        }

        tracing::info!("Scheduler stopped");
    }

    /// Stop the scheduler and wake its loop
    pub async fn stop(&self) {
        {
            let mut running = self.running.write().await;
            *running = false;
        }
        let _ = self.trigger_tx.try_send(());
    }

    /// Run one cycle now unless one is already in progress
    pub async fn run_once(&self) -> Option<CycleReport> {
        let report = self.engine.try_run_cycle(Utc::now()).await;

        match &report {
            Some(report) if report.is_clean() => tracing::info!(
                cycle_id = %report.cycle_id,
                sent = report.sent_count(),
                closed = report.closed.len(),
                "SLA cycle finished"
            ),
            Some(report) => tracing::warn!(
                cycle_id = %report.cycle_id,
                sent = report.sent_count(),
                closed = report.closed.len(),
                failures = report.failures.len(),
                "SLA cycle finished with failures"
            ),
            None => tracing::warn!("SLA cycle still in progress, skipping tick"),
        }

        report
    }
}
