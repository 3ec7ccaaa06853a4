use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, PositionRecord, PositionSink};
use common::nats::JetStreamPublisher;
use std::sync::Arc;
use tracing::{debug, warn};

/// Publishes position records to `{base_subject}.{partition_key}`
pub struct PositionRecordProducer {
    publisher: Arc<dyn JetStreamPublisher>,
    base_subject: String,
}

impl PositionRecordProducer {
    pub fn new(publisher: Arc<dyn JetStreamPublisher>, base_subject: String) -> Self {
        debug!(base_subject = %base_subject, "initialized PositionRecordProducer");
        Self {
            publisher,
            base_subject,
        }
    }
}

#[async_trait]
impl PositionSink for PositionRecordProducer {
    async fn put_records(&self, records: Vec<PositionRecord>) -> DomainResult<()> {
        let total = records.len();
        let mut failed = 0;

        for record in records {
            let subject = format!("{}.{}", self.base_subject, record.partition_key);
            if let Err(e) = self.publisher.publish(subject.clone(), record.data).await {
                warn!(subject = %subject, error = %e, "failed to publish position record");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(DomainError::RepositoryError(anyhow::anyhow!(
                "{} of {} position records failed to publish",
                failed,
                total
            )));
        }

        debug!(records = total, "published position records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use common::nats::MockJetStreamPublisher;

    fn record(partition_key: &str, data: &'static [u8]) -> PositionRecord {
        PositionRecord {
            partition_key: partition_key.to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_records_are_published_per_partition_subject() {
        let mut publisher = MockJetStreamPublisher::new();
        publisher
            .expect_publish()
            .withf(|subject: &String, payload: &Bytes| {
                subject == "positions.1" && payload.as_ref() == b"one"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        publisher
            .expect_publish()
            .withf(|subject: &String, payload: &Bytes| {
                subject == "positions.3" && payload.as_ref() == b"three"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let producer = PositionRecordProducer::new(Arc::new(publisher), "positions".to_string());
        let result = producer
            .put_records(vec![record("1", b"one"), record("3", b"three")])
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_partial_failure_still_publishes_the_rest() {
        let mut publisher = MockJetStreamPublisher::new();
        publisher
            .expect_publish()
            .withf(|subject: &String, _: &Bytes| subject == "positions.1")
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("no responders")));
        publisher
            .expect_publish()
            .withf(|subject: &String, _: &Bytes| subject == "positions.2")
            .times(1)
            .returning(|_, _| Ok(()));

        let producer = PositionRecordProducer::new(Arc::new(publisher), "positions".to_string());
        let result = producer
            .put_records(vec![record("1", b"a"), record("2", b"b")])
            .await;

        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_publishes_nothing() {
        let mut publisher = MockJetStreamPublisher::new();
        publisher.expect_publish().never();

        let producer = PositionRecordProducer::new(Arc::new(publisher), "positions".to_string());

        assert!(producer.put_records(Vec::new()).await.is_ok());
    }
}
