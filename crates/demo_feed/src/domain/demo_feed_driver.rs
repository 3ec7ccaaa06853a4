use crate::domain::DeviceScript;
use chrono::Utc;
use common::domain::{DomainResult, PositionRecord, PositionSample, PositionSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Replays recorded device scripts into a position sink on a timer
pub struct DemoFeedDriver {
    sink: Arc<dyn PositionSink>,
    running: Arc<AtomicBool>,
}

impl DemoFeedDriver {
    pub fn new(sink: Arc<dyn PositionSink>) -> Self {
        Self {
            sink,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Schedule one publish batch per step, step `i` at `i * interval` from now.
    ///
    /// Batch `i` carries the `i`-th sample of every script long enough to have
    /// one, stamped with the time the batch fires. The driver reports idle again
    /// at `(steps + 1) * interval` whatever the publish outcomes were. A run
    /// started while another is pending does not cancel it; their batches
    /// interleave and the earlier run's idle timer still fires.
    pub fn run_demo(&self, scripts: &[DeviceScript], interval: Duration) -> DemoRun {
        let started_at = Instant::now();
        let step_count = scripts.iter().map(DeviceScript::len).max().unwrap_or(0);
        self.running.store(true, Ordering::Release);

        info!(
            devices = scripts.len(),
            steps = step_count,
            interval_ms = interval.as_millis(),
            "starting demo run"
        );

        let mut tasks = Vec::with_capacity(step_count + 1);
        for step in 0..step_count {
            let batch: Vec<PositionSample> = scripts
                .iter()
                .filter_map(|script| script.samples.get(step).cloned())
                .collect();
            let sink = Arc::clone(&self.sink);
            let fire_at = started_at + step_offset(interval, step);

            tasks.push(tokio::spawn(async move {
                tokio::time::sleep_until(fire_at).await;
                publish_step(sink.as_ref(), step, &batch).await;
            }));
        }

        let running = Arc::clone(&self.running);
        let idle_at = started_at + step_offset(interval, step_count + 1);
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep_until(idle_at).await;
            running.store(false, Ordering::Release);
            debug!("demo run finished");
        }));

        DemoRun {
            running: Arc::clone(&self.running),
            step_count,
            tasks,
        }
    }
}

fn step_offset(interval: Duration, step: usize) -> Duration {
    interval.saturating_mul(u32::try_from(step).unwrap_or(u32::MAX))
}

async fn publish_step(sink: &dyn PositionSink, step: usize, batch: &[PositionSample]) {
    let now = Utc::now();
    let records: DomainResult<Vec<PositionRecord>> =
        batch.iter().map(|sample| sample.to_record(now)).collect();

    let result = match records {
        Ok(records) => sink.put_records(records).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => debug!(step, records = batch.len(), "published demo positions"),
        Err(e) => error!(step, error = %e, "failed to publish demo positions"),
    }
}

/// Scheduled publishes of one demo run
pub struct DemoRun {
    running: Arc<AtomicBool>,
    step_count: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl DemoRun {
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Scheduled tasks (publishes and the idle timer) that have not finished
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    /// Abort whatever is still scheduled and mark the driver idle
    pub fn cancel_all(&self) {
        let pending = self.pending();
        for task in &self.tasks {
            task.abort();
        }
        self.running.store(false, Ordering::Release);
        if pending > 0 {
            info!(pending, "cancelled demo run");
        }
    }

    /// Wait for every scheduled task to finish or be aborted
    pub async fn wait(&mut self) {
        for task in &mut self.tasks {
            if !task.is_finished() {
                let _ = task.await;
            }
        }
    }
}
