use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Handle to a background polling loop.
///
/// Dropping the handle cancels the loop without waiting for it.
#[derive(Debug)]
pub struct PollingHandle {
    token: CancellationToken,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl PollingHandle {
    pub fn new(token: CancellationToken, task: JoinHandle<anyhow::Result<()>>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop scheduling new cycles and wait for an in-flight cycle to finish
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "polling loop ended with error"),
                Err(e) => error!(error = %e, "polling loop panicked"),
            }
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
