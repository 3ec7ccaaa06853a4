use crate::domain::{DomainError, DomainResult, MessageQueue, QueueMessage, ReceiveOptions};
use anyhow::{anyhow, Context};
use async_nats::jetstream::{self, consumer::PullConsumer};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// MessageQueue backed by a durable JetStream pull consumer.
///
/// Each delivery gets a fresh receipt handle; deleting a message acks the
/// JetStream delivery it was received with. Deliveries that were never
/// deleted are forgotten once their visibility timeout has passed, since
/// JetStream redelivers them under a new handle.
pub struct NatsMessageQueue {
    consumer: PullConsumer,
    visibility_timeout: Duration,
    in_flight: Mutex<HashMap<String, (jetstream::Message, Instant)>>,
}

impl NatsMessageQueue {
    pub fn new(consumer: PullConsumer, visibility_timeout: Duration) -> Self {
        Self {
            consumer,
            visibility_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    async fn prune_expired(&self) {
        let mut in_flight = self.in_flight.lock().await;
        let before = in_flight.len();
        let visibility_timeout = self.visibility_timeout;
        in_flight.retain(|_, (_, received_at)| received_at.elapsed() < visibility_timeout);
        let pruned = before - in_flight.len();
        if pruned > 0 {
            debug!(pruned, "dropped expired receipt handles");
        }
    }
}

#[async_trait]
impl MessageQueue for NatsMessageQueue {
    async fn receive_messages(&self, options: ReceiveOptions) -> DomainResult<Vec<QueueMessage>> {
        if options.visibility_timeout != self.visibility_timeout {
            warn!(
                requested_secs = options.visibility_timeout.as_secs(),
                configured_secs = self.visibility_timeout.as_secs(),
                "visibility timeout is fixed when the consumer is created; using configured value"
            );
        }

        self.prune_expired().await;

        let mut batch = self
            .consumer
            .fetch()
            .max_messages(options.max_messages)
            .expires(options.wait_time)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut received = Vec::new();
        while let Some(result) = batch.next().await {
            match result {
                Ok(message) => received.push(message),
                Err(e) => {
                    error!(error = %e, "Error receiving message from batch");
                }
            }
        }

        let now = Instant::now();
        let mut in_flight = self.in_flight.lock().await;
        let messages = received
            .into_iter()
            .map(|message| {
                let receipt_handle = xid::new().to_string();
                let body = message.payload.clone();
                in_flight.insert(receipt_handle.clone(), (message, now));
                QueueMessage {
                    receipt_handle,
                    body,
                }
            })
            .collect();

        Ok(messages)
    }

    async fn delete_message(&self, receipt_handle: &str) -> DomainResult<()> {
        let entry = self.in_flight.lock().await.remove(receipt_handle);

        let (message, _) = entry.ok_or_else(|| {
            DomainError::RepositoryError(anyhow!(
                "unknown or expired receipt handle: {}",
                receipt_handle
            ))
        })?;

        message
            .ack()
            .await
            .map_err(|e| anyhow!("Failed to acknowledge message: {}", e))?;

        Ok(())
    }
}
