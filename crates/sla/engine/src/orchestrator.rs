//! Run orchestrator: one complete evaluation pass over all tickets
//!
//! A cycle runs four phases in a fixed order:
//!
//! 1. record timestamps on every ticket
//! 2. first-response milestones over Open tickets
//! 3. resolution milestones over Open and In-Progress tickets
//! 4. close Resolved tickets whose grace period has passed
//!
//! Timestamps go first so the guards of phases 2 and 3 see the latest
//! state. A failing ticket is logged, reported and skipped; it never aborts
//! the cycle.

use crate::closer::LifecycleCloser;
use crate::dispatcher::NotificationDispatcher;
use crate::ports::{
    find_or_create_record, AssigneeDirectory, MailTransport, TicketStore, TrackingStore,
};
use crate::recorder::{RecordedTimestamps, TimestampRecorder};
use crate::report::{CyclePhase, CycleReport, NotificationOutcome, NotificationRecord};
use crate::tracker::MilestoneTracker;
use chrono::{DateTime, Duration, Utc};
use sla_types::{Milestone, SlaDimension, SlaResult, Ticket, TicketStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

/// Engine tuning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a ticket stays Resolved before it is closed
    pub close_grace_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            close_grace_period: Duration::seconds(LifecycleCloser::DEFAULT_GRACE_SECS),
        }
    }
}

/// Entry point of the engine. Holds no state between cycles except the
/// guard that keeps two cycles from overlapping.
pub struct SlaOrchestrator {
    tickets: Arc<dyn TicketStore>,
    tracking: Arc<dyn TrackingStore>,
    recorder: TimestampRecorder,
    first_response: MilestoneTracker,
    resolution: MilestoneTracker,
    dispatcher: NotificationDispatcher,
    closer: LifecycleCloser,
    cycle_guard: Mutex<()>,
}

impl SlaOrchestrator {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        tracking: Arc<dyn TrackingStore>,
        directory: Arc<dyn AssigneeDirectory>,
        transport: Arc<dyn MailTransport>,
        config: EngineConfig,
    ) -> Self {
        Self {
            tickets,
            tracking,
            recorder: TimestampRecorder::new(),
            first_response: MilestoneTracker::first_response(),
            resolution: MilestoneTracker::resolution(),
            dispatcher: NotificationDispatcher::new(directory, transport),
            closer: LifecycleCloser::new(config.close_grace_period),
            cycle_guard: Mutex::new(()),
        }
    }

    pub fn tracking_store(&self) -> Arc<dyn TrackingStore> {
        Arc::clone(&self.tracking)
    }

    /// Whether a cycle is executing right now
    pub fn is_running(&self) -> bool {
        self.cycle_guard.try_lock().is_err()
    }

    /// Run one cycle at `now`, waiting for any cycle already in progress
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let _guard = self.cycle_guard.lock().await;
        self.execute(now).await
    }

    /// Run one cycle at `now` unless another is in progress, in which case
    /// nothing happens and `None` is returned
    pub async fn try_run_cycle(&self, now: DateTime<Utc>) -> Option<CycleReport> {
        let _guard = self.cycle_guard.try_lock().ok()?;
        Some(self.execute(now).await)
    }

    async fn execute(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::new(now);
        let span = tracing::info_span!("sla_cycle", cycle_id = %report.cycle_id);

        async {
            tracing::debug!(evaluated_at = %now, "SLA cycle started");

            self.record_timestamps(now, &mut report).await;
            self.evaluate_dimension(&self.first_response, now, &mut report)
                .await;
            self.evaluate_dimension(&self.resolution, now, &mut report)
                .await;
            self.close_resolved(now, &mut report).await;

            tracing::info!(
                first_responses = report.first_responses_recorded,
                resolutions = report.resolutions_recorded,
                notifications = report.notifications.len(),
                sent = report.sent_count(),
                closed = report.closed.len(),
                failures = report.failures.len(),
                "SLA cycle complete"
            );
        }
        .instrument(span)
        .await;

        report
    }

    // ── Phase 1: timestamps ─────────────────────────────────────────

    async fn record_timestamps(&self, now: DateTime<Utc>, report: &mut CycleReport) {
        let tickets = match self.tickets.list_by_status(&TicketStatus::ALL).await {
            Ok(tickets) => tickets,
            Err(e) => {
                report.record_failure(None, CyclePhase::Timestamps, e);
                return;
            }
        };

        for ticket in &tickets {
            match self.record_ticket_timestamps(ticket, now).await {
                Ok(changed) => {
                    report.first_responses_recorded += changed.first_response as usize;
                    report.resolutions_recorded += changed.resolution as usize;
                }
                Err(e) => report.record_failure(Some(&ticket.id), CyclePhase::Timestamps, e),
            }
        }
    }

    async fn record_ticket_timestamps(
        &self,
        ticket: &Ticket,
        now: DateTime<Utc>,
    ) -> SlaResult<RecordedTimestamps> {
        let mut record = find_or_create_record(self.tracking.as_ref(), &ticket.id, now).await?;
        let changed = self.recorder.apply(ticket, &mut record, now);
        if changed.any() {
            record.touch(now);
            self.tracking.save_record(&record).await?;
            tracing::debug!(
                ticket_id = %ticket.id,
                first_response = changed.first_response,
                resolution = changed.resolution,
                "Recorded SLA timestamps"
            );
        }
        Ok(changed)
    }

    // ── Phases 2 and 3: milestones ──────────────────────────────────

    async fn evaluate_dimension(
        &self,
        tracker: &MilestoneTracker,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let dimension = tracker.dimension();
        let phase = CyclePhase::from(dimension);

        let tickets = match self.tickets.list_by_status(statuses_for(dimension)).await {
            Ok(tickets) => tickets,
            Err(e) => {
                report.record_failure(None, phase, e);
                return;
            }
        };

        for ticket in &tickets {
            let crossed = match self.mark_milestones(tracker, ticket, now).await {
                Ok(crossed) => crossed,
                Err(e) => {
                    report.record_failure(Some(&ticket.id), phase, e);
                    continue;
                }
            };

            // Flags are durable at this point; each alert is attempted once.
            for milestone in crossed {
                let outcome = match self.dispatcher.notify(ticket, dimension, milestone).await {
                    Ok(outcome) => outcome.into(),
                    Err(e) => {
                        tracing::error!(
                            ticket_id = %ticket.id,
                            dimension = %dimension,
                            milestone = %milestone,
                            error = %e,
                            "SLA alert delivery failed"
                        );
                        NotificationOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                report.notifications.push(NotificationRecord {
                    ticket_id: ticket.id.clone(),
                    dimension,
                    milestone,
                    outcome,
                });
            }
        }
    }

    /// Flip and persist the flags for newly crossed milestones. Nothing is
    /// returned, and so nothing is sent, unless the save succeeded.
    async fn mark_milestones(
        &self,
        tracker: &MilestoneTracker,
        ticket: &Ticket,
        now: DateTime<Utc>,
    ) -> SlaResult<Vec<Milestone>> {
        let mut record = find_or_create_record(self.tracking.as_ref(), &ticket.id, now).await?;
        let crossed = tracker.evaluate(ticket, &mut record, now);
        if !crossed.is_empty() {
            record.touch(now);
            self.tracking.save_record(&record).await?;
        }
        Ok(crossed)
    }

    // ── Phase 4: close ──────────────────────────────────────────────

    async fn close_resolved(&self, now: DateTime<Utc>, report: &mut CycleReport) {
        let resolved = match self.tickets.list_by_status(&[TicketStatus::Resolved]).await {
            Ok(tickets) => tickets,
            Err(e) => {
                report.record_failure(None, CyclePhase::Close, e);
                return;
            }
        };

        tracing::debug!(
            resolved = resolved.len(),
            grace_secs = self.closer.grace_period().num_seconds(),
            "Checking resolved tickets for auto-close"
        );

        for ticket in &resolved {
            match self
                .closer
                .close_if_due(self.tickets.as_ref(), ticket, now)
                .await
            {
                Ok(true) => report.closed.push(ticket.id.clone()),
                Ok(false) => {}
                Err(e) => report.record_failure(Some(&ticket.id), CyclePhase::Close, e),
            }
        }
    }
}

/// Statuses whose tickets are evaluated for a dimension
fn statuses_for(dimension: SlaDimension) -> &'static [TicketStatus] {
    match dimension {
        SlaDimension::FirstResponse => &[TicketStatus::Open],
        SlaDimension::Resolution => &[TicketStatus::Open, TicketStatus::InProgress],
    }
}

impl std::fmt::Debug for SlaOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlaOrchestrator")
            .field("closer", &self.closer)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
