use anyhow::Result;
use async_trait::async_trait;

/// Trait for JetStream publisher operations
/// Abstracts publishing so producers can be tested without a NATS server
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait JetStreamPublisher: Send + Sync {
    /// Publish a message to a subject and await the stream acknowledgment
    async fn publish(&self, subject: String, payload: bytes::Bytes) -> Result<()>;
}
