use crate::domain::{demo_scripts, DemoFeedDriver};
use crate::nats::PositionRecordProducer;
use common::nats::NatsClient;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct DemoFeedConfig {
    pub positions_subject: String,
    pub interval: Duration,
    /// Start the built-in demo as soon as the process runs
    pub run_on_start: bool,
}

pub struct DemoFeed {
    driver: Arc<DemoFeedDriver>,
    interval: Duration,
    run_on_start: bool,
}

impl DemoFeed {
    pub fn new(nats_client: &NatsClient, config: DemoFeedConfig) -> Self {
        info!("Initializing Demo Feed module");

        let producer = PositionRecordProducer::new(
            nats_client.create_publisher_client(),
            config.positions_subject,
        );
        let driver = Arc::new(DemoFeedDriver::new(Arc::new(producer)));

        info!("Demo Feed initialized");

        Self {
            driver,
            interval: config.interval,
            run_on_start: config.run_on_start,
        }
    }

    pub fn driver(&self) -> Arc<DemoFeedDriver> {
        Arc::clone(&self.driver)
    }

    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
            + Send,
    > {
        let driver = self.driver;
        let interval = self.interval;
        let run_on_start = self.run_on_start;

        Box::new(move |ctx| {
            Box::pin(async move {
                if !run_on_start {
                    info!("Demo run on start disabled");
                    return Ok(());
                }

                let mut run = driver.run_demo(&demo_scripts(), interval);
                let cancelled = tokio::select! {
                    _ = ctx.cancelled() => true,
                    _ = run.wait() => false,
                };

                if cancelled {
                    info!("Received shutdown signal, cancelling demo run");
                    run.cancel_all();
                } else {
                    info!("Demo run completed");
                }
                Ok(())
            })
        })
    }
}
