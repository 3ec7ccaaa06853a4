use crate::domain::MessageQueue;
use crate::nats::message_queue::NatsMessageQueue;
use crate::nats::trace_context::inject_trace_context;
use crate::nats::traits::JetStreamPublisher;
use anyhow::{anyhow, Context, Result};
use async_nats::jetstream::{self, stream::Config as StreamConfig};
use async_nats::HeaderMap;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub struct NatsClient {
    jetstream: jetstream::Context,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis(), "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let jetstream = jetstream::new(client);

        info!("Successfully connected to NATS");
        Ok(Self { jetstream })
    }

    /// Create the stream if it does not exist yet. Subjects are `<stream>.>`.
    pub async fn ensure_stream(&self, stream_name: &str, description: &str) -> Result<()> {
        info!(stream = %stream_name, "Ensuring stream exists");

        let stream_config = StreamConfig {
            name: stream_name.to_string(),
            subjects: vec![format!("{}.>", stream_name)],
            description: Some(description.to_string()),
            ..Default::default()
        };

        match self.jetstream.get_stream(stream_name).await {
            Ok(_) => {
                info!(stream = %stream_name, "Stream already exists");
            }
            Err(_) => {
                self.jetstream
                    .create_stream(stream_config)
                    .await
                    .context("Failed to create stream")?;
                info!(stream = %stream_name, "Created stream");
            }
        }

        Ok(())
    }

    /// Bind a durable pull consumer and expose it as a MessageQueue.
    ///
    /// The consumer's ack wait is the queue's visibility timeout: messages
    /// that are not deleted within it are redelivered.
    pub async fn create_message_queue(
        &self,
        stream_name: &str,
        consumer_name: &str,
        filter_subject: &str,
        visibility_timeout: Duration,
    ) -> Result<Arc<dyn MessageQueue>> {
        let consumer = self
            .jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: filter_subject.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ack_wait: visibility_timeout,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer {}: {}", consumer_name, e))?;

        info!(
            stream = %stream_name,
            consumer = %consumer_name,
            filter_subject = %filter_subject,
            visibility_timeout_secs = visibility_timeout.as_secs(),
            "Message queue consumer ready"
        );

        Ok(Arc::new(NatsMessageQueue::new(consumer, visibility_timeout)))
    }

    /// Create a JetStreamPublisher trait object from this client
    pub fn create_publisher_client(&self) -> Arc<dyn JetStreamPublisher> {
        Arc::new(NatsJetStreamPublisher::new(self.jetstream.clone()))
    }

    pub async fn close(self) {
        info!("Closing NATS connection");
        // Connection closes when the last handle is dropped
    }
}

/// Concrete implementation of JetStreamPublisher using async-nats
pub struct NatsJetStreamPublisher {
    context: jetstream::Context,
}

impl NatsJetStreamPublisher {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl JetStreamPublisher for NatsJetStreamPublisher {
    #[instrument(skip(self, payload), fields(subject = %subject, payload_size = payload.len()))]
    async fn publish(&self, subject: String, payload: bytes::Bytes) -> Result<()> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        let ack = self
            .context
            .publish_with_headers(subject, headers, payload)
            .await
            .context("Failed to publish message to JetStream")?;

        ack.await
            .context("Failed to receive JetStream acknowledgment")?;
        Ok(())
    }
}
