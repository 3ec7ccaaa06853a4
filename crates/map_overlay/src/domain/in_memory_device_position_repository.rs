use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::domain::{DevicePosition, DevicePositionRepository, DomainResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory tracker keeping recorded positions per device.
///
/// With a retention window, samples older than the window are pruned on each
/// record. The latest sample of a device is always kept.
pub struct InMemoryDevicePositionRepository {
    positions: Arc<RwLock<HashMap<String, Vec<DevicePosition>>>>,
    retention: Option<chrono::Duration>,
}

impl InMemoryDevicePositionRepository {
    pub fn new() -> Self {
        Self {
            positions: Arc::new(RwLock::new(HashMap::new())),
            retention: None,
        }
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            positions: Arc::new(RwLock::new(HashMap::new())),
            retention: chrono::Duration::from_std(retention).ok(),
        }
    }
}

impl Default for InMemoryDevicePositionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DevicePositionRepository for InMemoryDevicePositionRepository {
    async fn record_position(&self, position: DevicePosition) -> DomainResult<()> {
        let mut positions = self.positions.write().await;
        let history = positions.entry(position.device_id.clone()).or_default();
        // Late samples are inserted in time order
        let index = history.partition_point(|p| p.sample_time <= position.sample_time);
        history.insert(index, position);

        if let Some(retention) = self.retention {
            let cutoff = Utc::now() - retention;
            let stale = history
                .partition_point(|p| p.sample_time < cutoff)
                .min(history.len() - 1);
            history.drain(..stale);
        }
        Ok(())
    }

    async fn list_device_positions(&self) -> DomainResult<Vec<DevicePosition>> {
        let positions = self.positions.read().await;
        Ok(positions
            .values()
            .filter_map(|history| history.last().cloned())
            .collect())
    }

    async fn get_device_position_history(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<DevicePosition>> {
        let positions = self.positions.read().await;
        Ok(positions
            .get(device_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|p| p.sample_time >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
