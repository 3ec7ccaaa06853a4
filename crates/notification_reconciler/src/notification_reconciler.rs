use crate::domain::NotificationReconciler;
use common::domain::{BreachingSet, ReceiveOptions};
use common::nats::NatsClient;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct NotificationReconcilerConfig {
    pub breach_events_stream: String,
    pub breach_events_subject: String,
    pub consumer_name: String,
    pub poll_interval: Duration,
    pub receive_options: ReceiveOptions,
}

pub struct NotificationReconcilerWorker {
    reconciler: Arc<NotificationReconciler>,
    poll_interval: Duration,
}

impl NotificationReconcilerWorker {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        breaching_set: Arc<BreachingSet>,
        config: NotificationReconcilerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing Notification Reconciler module");

        let queue = nats_client
            .create_message_queue(
                &config.breach_events_stream,
                &config.consumer_name,
                &config.breach_events_subject,
                config.receive_options.visibility_timeout,
            )
            .await?;

        let reconciler = Arc::new(NotificationReconciler::new(
            queue,
            breaching_set,
            config.receive_options,
        ));

        info!("Notification Reconciler initialized");

        Ok(Self {
            reconciler,
            poll_interval: config.poll_interval,
        })
    }

    /// Shared handle for reading notifications or resetting the session
    pub fn reconciler(&self) -> Arc<NotificationReconciler> {
        Arc::clone(&self.reconciler)
    }

    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
            + Send,
    > {
        let reconciler = self.reconciler;
        let interval = self.poll_interval;
        Box::new(move |ctx| Box::pin(async move { reconciler.run(interval, ctx).await }))
    }
}
