//! Lifecycle runner for the geotrack processes.
//!
//! Named processes (queue pollers, the demo feed, overlay refreshers) run
//! concurrently under one cancellation token. The first failure, a SIGINT or a
//! SIGTERM cancels the rest; closers then run under a timeout.
//!
//! # Example
//!
//! ```no_run
//! use geotrack_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new()
//!         .with_app_process(|ctx| async move {
//!             let mut ticker = tokio::time::interval(Duration::from_secs(1));
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => break,
//!                     _ = ticker.tick() => tracing::info!("polling"),
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move { Ok(()) })
//!         .run()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A long-running process. Receives the shared cancellation token.
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;

/// A cleanup function run after every process has stopped.
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

pub struct Runner {
    processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Runner with a 10 second closer timeout and no processes.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds an already boxed process under a name used in logs.
    pub fn with_named_process(mut self, name: impl Into<String>, process: AppProcess) -> Self {
        self.processes.push((name.into(), process));
        self
    }

    /// Adds a process built from a closure. Named `process-<n>` in logs.
    pub fn with_app_process<F, Fut>(self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = format!("process-{}", self.processes.len());
        self.with_named_process(name, Box::new(|token| Box::pin(process(token))))
    }

    /// Adds a closer. Closers run concurrently once all processes have stopped,
    /// whatever the reason they stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned token, e.g. to stop the runner from a test.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs until stopped, then exits the process (code 1 if a process failed).
    pub async fn run(self) {
        let token = self.cancellation_token.clone();
        spawn_signal_handlers(token);

        match self.run_until_stopped().await {
            Ok(()) => {
                info!("Application exiting normally");
                std::process::exit(0);
            }
            Err(err) => {
                error!("Application exiting with error: {:#}", err);
                std::process::exit(1);
            }
        }
    }

    /// Runs every process until one fails or the token is cancelled, then runs
    /// the closers. Returns the first process error, if any.
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for (name, process) in self.processes {
            let process_token = token.clone();
            info!(process = %name, "Starting process");
            join_set.spawn(async move { (name, process(process_token).await) });
        }

        let mut first_error = None;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                joined = join_set.join_next() => {
                    match joined {
                        None => break,
                        Some(Ok((name, Ok(())))) => {
                            debug!(process = %name, "Process completed");
                        }
                        Some(Ok((name, Err(err)))) => {
                            error!(process = %name, "Process failed: {:#}", err);
                            first_error = Some(err);
                            token.cancel();
                            break;
                        }
                        Some(Err(err)) => {
                            error!("Process panicked: {}", err);
                            first_error = Some(anyhow::anyhow!("process panicked: {}", err));
                            token.cancel();
                            break;
                        }
                    }
                }
            }
        }

        // Processes see the cancelled token and wind down on their own
        while let Some(joined) = join_set.join_next().await {
            if let Ok((name, Err(err))) = joined {
                debug!(process = %name, "Process returned error during shutdown: {:#}", err);
            }
        }

        if !self.closers.is_empty() {
            info!("Running closers with timeout of {:?}", self.closer_timeout);
            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => info!("All closers completed"),
                Err(_) => error!("Closers timed out after {:?}", self.closer_timeout),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => error!("Error setting up signal handler: {}", err),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => error!("Error setting up SIGTERM handler: {}", err),
        }
    });
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("Closer completed successfully"),
            Ok(Err(err)) => error!("Closer error: {:#}", err),
            Err(err) => error!("Closer panicked: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cancellation_stops_processes_and_runs_closers() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = closer_called.clone();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = Runner::new()
            .with_app_process(|ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || async move {
                closer_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_cancellation_token(token)
            .run_until_stopped()
            .await;

        assert!(result.is_ok());
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failing_process_cancels_the_others() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let stopped_flag = stopped.clone();

        let result = Runner::new()
            .with_app_process(|_ctx| async move { Err(anyhow::anyhow!("queue unreachable")) })
            .with_app_process(move |ctx| async move {
                ctx.cancelled().await;
                stopped_flag.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .run_until_stopped()
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("queue unreachable"));
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_processes_completing_on_their_own() {
        let result = Runner::new()
            .with_named_process("one-shot", Box::new(|_ctx| Box::pin(async { Ok(()) })))
            .run_until_stopped()
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_closer_timeout_does_not_hang() {
        let result = Runner::new()
            .with_closer(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .with_closer_timeout(Duration::from_millis(20))
            .run_until_stopped()
            .await;

        assert!(result.is_ok());
    }
}
