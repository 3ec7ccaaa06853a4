use common::domain::{
    DevicePosition, DevicePositionRepository, DomainResult, MessageQueue, PositionUpdate,
    ReceiveOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Feeds published position updates into the tracker
pub struct PositionIngester {
    queue: Arc<dyn MessageQueue>,
    repository: Arc<dyn DevicePositionRepository>,
    receive_options: ReceiveOptions,
}

impl PositionIngester {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        repository: Arc<dyn DevicePositionRepository>,
        receive_options: ReceiveOptions,
    ) -> Self {
        Self {
            queue,
            repository,
            receive_options,
        }
    }

    /// Ingest batches until `ctx` is cancelled. A batch already received is
    /// always finished, so nothing recorded is left unacknowledged.
    pub async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        info!("Starting position ingester loop");

        while !ctx.is_cancelled() {
            if let Err(e) = self.ingest_batch().await {
                error!(error = %e, "Error ingesting position batch");
                tokio::select! {
                    _ = ctx.cancelled() => {}
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
            }
        }

        info!("Position ingester stopped gracefully");
        Ok(())
    }

    /// Receive one batch and record every valid update. Returns how many were
    /// recorded. Updates the tracker failed to store are left for redelivery;
    /// malformed ones are deleted.
    pub async fn ingest_batch(&self) -> DomainResult<usize> {
        let messages = self.queue.receive_messages(self.receive_options).await?;
        if messages.is_empty() {
            return Ok(0);
        }

        let mut recorded = 0;
        for message in messages {
            match PositionUpdate::from_json(&message.body) {
                Ok(update) => {
                    let device_id = update.device_id.clone();
                    if let Err(e) = self.repository.record_position(DevicePosition::from(update)).await {
                        warn!(device_id = %device_id, error = %e, "failed to record position");
                        continue;
                    }
                    recorded += 1;
                }
                Err(e) => {
                    error!(error = %e, "discarding malformed position update");
                }
            }

            if let Err(e) = self.queue.delete_message(&message.receipt_handle).await {
                warn!(
                    receipt_handle = %message.receipt_handle,
                    error = %e,
                    "failed to delete position update"
                );
            }
        }

        debug!(recorded, "ingested position batch");
        Ok(recorded)
    }
}
