use chrono::Utc;
use common::domain::{DevicePosition, DevicePositionRepository, DomainResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_HISTORY_OFFSET: Duration = Duration::from_secs(3600);

/// Read side of the tracker: device list and per-device history
pub struct TrackerService {
    repository: Arc<dyn DevicePositionRepository>,
    history_offset: Duration,
}

impl TrackerService {
    pub fn new(repository: Arc<dyn DevicePositionRepository>, history_offset: Duration) -> Self {
        Self {
            repository,
            history_offset,
        }
    }

    /// Latest position of every device, most recently seen first
    pub async fn list_devices(&self) -> DomainResult<Vec<DevicePosition>> {
        let mut devices = self.repository.list_device_positions().await?;
        devices.sort_by(|a, b| b.sample_time.cmp(&a.sample_time));
        Ok(devices)
    }

    /// Positions of `device_id` within the history offset.
    ///
    /// When the window is empty the device's current position is returned
    /// instead, so a device that stopped reporting still shows where it is.
    pub async fn device_history(&self, device_id: &str) -> DomainResult<Vec<DevicePosition>> {
        let offset = chrono::Duration::from_std(self.history_offset)
            .unwrap_or_else(|_| chrono::Duration::seconds(3600));
        let since = Utc::now() - offset;

        let history = self
            .repository
            .get_device_position_history(device_id, since)
            .await?;
        if !history.is_empty() {
            return Ok(history);
        }

        debug!(device_id = %device_id, "no recent history, falling back to current position");
        let current = self
            .list_devices()
            .await?
            .into_iter()
            .filter(|device| device.device_id == device_id)
            .collect();
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration};
    use common::domain::MockDevicePositionRepository;

    fn position(device: &str, time: DateTime<Utc>) -> DevicePosition {
        DevicePosition {
            device_id: device.to_string(),
            position: [-122.33, 47.54],
            sample_time: time,
        }
    }

    #[tokio::test]
    async fn test_devices_sorted_newest_first() {
        let now = Utc::now();
        let mut repository = MockDevicePositionRepository::new();
        repository.expect_list_device_positions().returning(move || {
            Ok(vec![
                position("Truck-1", now - ChronoDuration::seconds(30)),
                position("Truck-2", now),
                position("Truck-3", now - ChronoDuration::seconds(60)),
            ])
        });

        let service = TrackerService::new(Arc::new(repository), DEFAULT_HISTORY_OFFSET);
        let devices = service.list_devices().await.unwrap();

        let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["Truck-2", "Truck-1", "Truck-3"]);
    }

    #[tokio::test]
    async fn test_history_uses_offset_window() {
        let now = Utc::now();
        let mut repository = MockDevicePositionRepository::new();
        repository
            .expect_get_device_position_history()
            .withf(move |device_id: &str, since: &DateTime<Utc>| {
                let age = now - *since;
                device_id == "Truck-1" && age >= ChronoDuration::seconds(599) && age <= ChronoDuration::seconds(601)
            })
            .times(1)
            .returning(move |_, _| Ok(vec![position("Truck-1", now)]));
        repository.expect_list_device_positions().never();

        let service = TrackerService::new(Arc::new(repository), Duration::from_secs(600));
        let history = service.device_history("Truck-1").await.unwrap();

        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_history_falls_back_to_current_position() {
        let now = Utc::now();
        let mut repository = MockDevicePositionRepository::new();
        repository
            .expect_get_device_position_history()
            .returning(|_, _| Ok(Vec::new()));
        repository.expect_list_device_positions().returning(move || {
            Ok(vec![
                position("Truck-1", now - ChronoDuration::hours(3)),
                position("Truck-2", now),
            ])
        });

        let service = TrackerService::new(Arc::new(repository), DEFAULT_HISTORY_OFFSET);
        let history = service.device_history("Truck-1").await.unwrap();

        assert_eq!(history, vec![position("Truck-1", now - ChronoDuration::hours(3))]);
    }
}
