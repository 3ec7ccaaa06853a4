use crate::domain::{NotificationLog, PollingHandle};
use common::domain::{BreachEvent, BreachingSet, MessageQueue, QueueMessage, ReceiveOptions};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Counters for one fetch-and-process cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    pub applied: usize,
    pub duplicates: usize,
    pub unparseable: usize,
    pub deleted: usize,
    pub delete_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A previous cycle was still outstanding
    Skipped,
    /// The fetch itself failed; nothing was processed
    Failed,
    Completed(CycleReport),
}

/// Keeps the breaching set and notification history in step with a queue of
/// breach events that may redeliver and may deliver late.
///
/// Each cycle fetches a bounded batch, applies events whose id has not been
/// seen this session, and deletes every fetched message whether or not it was
/// applied. Failures are logged and left to the next cycle.
pub struct NotificationReconciler {
    queue: Arc<dyn MessageQueue>,
    breaching_set: Arc<BreachingSet>,
    log: NotificationLog,
    receive_options: ReceiveOptions,
    cycle_in_progress: AtomicBool,
}

impl NotificationReconciler {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        breaching_set: Arc<BreachingSet>,
        receive_options: ReceiveOptions,
    ) -> Self {
        Self {
            queue,
            breaching_set,
            log: NotificationLog::new(),
            receive_options,
            cycle_in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_cycle_in_progress(&self) -> bool {
        self.cycle_in_progress.load(Ordering::Acquire)
    }

    /// Run one fetch-and-process cycle, or skip it if one is already running
    #[instrument(skip(self))]
    pub async fn poll_once(&self) -> CycleOutcome {
        let Some(_guard) = CycleGuard::acquire(&self.cycle_in_progress) else {
            debug!("previous cycle still in progress, skipping");
            return CycleOutcome::Skipped;
        };

        let messages = match self.queue.receive_messages(self.receive_options).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "failed to receive breach notifications");
                return CycleOutcome::Failed;
            }
        };

        let mut report = CycleReport {
            received: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            self.process_message(message, &mut report).await;

            match self.queue.delete_message(&message.receipt_handle).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        receipt_handle = %message.receipt_handle,
                        "failed to delete breach notification"
                    );
                    report.delete_failures += 1;
                }
            }
        }

        if report.received > 0 {
            debug!(
                received = report.received,
                applied = report.applied,
                duplicates = report.duplicates,
                unparseable = report.unparseable,
                deleted = report.deleted,
                "processed breach notification batch"
            );
        }

        CycleOutcome::Completed(report)
    }

    async fn process_message(&self, message: &QueueMessage, report: &mut CycleReport) {
        let event = match BreachEvent::from_json(&message.body) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    error = %e,
                    receipt_handle = %message.receipt_handle,
                    "discarding unparseable breach notification"
                );
                report.unparseable += 1;
                return;
            }
        };

        if !self.log.record(&event).await {
            debug!(event_id = %event.event_id, "duplicate breach notification");
            report.duplicates += 1;
            return;
        }

        self.breaching_set.apply(&event).await;
        report.applied += 1;
        info!(
            event_id = %event.event_id,
            device_id = %event.device_id,
            geofence_id = %event.geofence_id,
            event_type = event.event_type.as_str(),
            "{}",
            event
        );
    }

    /// Poll every `interval` until `ctx` is cancelled.
    ///
    /// Ticks that land while a cycle is outstanding are skipped, not queued.
    /// On cancellation the in-flight cycle is allowed to finish.
    pub async fn run(self: Arc<Self>, interval: Duration, ctx: CancellationToken) -> anyhow::Result<()> {
        ensure_poll_interval(interval)?;
        info!(interval_ms = interval.as_millis(), "starting breach notification polling");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<CycleOutcome>> = None;

        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = ticker.tick() => {
                    // The spawned task may not have taken the cycle flag yet
                    let outstanding = in_flight
                        .as_ref()
                        .is_some_and(|handle| !handle.is_finished());
                    if outstanding || self.is_cycle_in_progress() {
                        debug!("previous cycle still in progress, skipping tick");
                        continue;
                    }
                    let reconciler = Arc::clone(&self);
                    in_flight = Some(tokio::spawn(async move { reconciler.poll_once().await }));
                }
            }
        }

        if let Some(handle) = in_flight {
            if let Err(e) = handle.await {
                error!(error = %e, "in-flight cycle panicked");
            }
        }

        info!("breach notification polling stopped");
        Ok(())
    }

    /// Start polling in the background. Stop it through the returned handle.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> anyhow::Result<PollingHandle> {
        ensure_poll_interval(interval)?;
        let token = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(self).run(interval, token.clone()));
        Ok(PollingHandle::new(token, task))
    }

    /// Clear notification history and seen ids. The breaching set is kept.
    pub async fn reset_session(&self) {
        self.log.reset().await;
        debug!("notification session reset");
    }

    pub async fn notifications(&self) -> Vec<BreachEvent> {
        self.log.history().await
    }

    pub async fn breaching_geofence_ids(&self) -> BTreeSet<String> {
        self.breaching_set.breaching_geofence_ids().await
    }
}

fn ensure_poll_interval(interval: Duration) -> anyhow::Result<()> {
    anyhow::ensure!(!interval.is_zero(), "poll interval must be non-zero");
    Ok(())
}

/// Holds the cycle flag for the duration of a cycle
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
