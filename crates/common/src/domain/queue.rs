use crate::domain::result::DomainResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// One delivery of a queue message
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// Opaque token identifying this delivery; used to delete the message
    pub receipt_handle: String,
    pub body: Bytes,
}

/// Parameters of a single receive call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiveOptions {
    /// Upper bound on messages returned by one call
    pub max_messages: usize,
    /// How long received messages stay hidden from other receivers before redelivery
    pub visibility_timeout: Duration,
    /// How long to wait for messages to arrive before returning an empty batch
    pub wait_time: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            visibility_timeout: Duration::from_secs(20),
            wait_time: Duration::from_secs(5),
        }
    }
}

/// Trait for an at-least-once message queue
///
/// Messages that are received but not deleted become visible again once the
/// visibility timeout expires.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receive up to `options.max_messages` pending messages
    async fn receive_messages(&self, options: ReceiveOptions) -> DomainResult<Vec<QueueMessage>>;

    /// Delete (acknowledge) a received message
    async fn delete_message(&self, receipt_handle: &str) -> DomainResult<()>;
}
