use crate::domain::result::{DomainError, DomainResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One step of a recorded device path, not yet stamped with a time
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    pub device_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub partition_key: String,
}

impl PositionSample {
    pub fn new(
        device_id: impl Into<String>,
        longitude: f64,
        latitude: f64,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            longitude,
            latitude,
            partition_key: partition_key.into(),
        }
    }

    /// Stamp the sample with `time` and encode it for the stream sink
    pub fn to_record(&self, time: DateTime<Utc>) -> DomainResult<PositionRecord> {
        let update = PositionUpdate {
            device_id: self.device_id.clone(),
            position: [self.longitude, self.latitude],
            time,
        };
        Ok(PositionRecord {
            partition_key: self.partition_key.clone(),
            data: Bytes::from(serde_json::to_vec(&update)?),
        })
    }
}

/// JSON payload of a published position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionUpdate {
    pub device_id: String,
    /// `[longitude, latitude]`
    pub position: [f64; 2],
    pub time: DateTime<Utc>,
}

impl PositionUpdate {
    pub fn from_json(data: &[u8]) -> DomainResult<Self> {
        let update: PositionUpdate = serde_json::from_slice(data)?;
        if update.device_id.is_empty() {
            return Err(DomainError::InvalidPositionRecord(
                "device id must not be empty".to_string(),
            ));
        }
        Ok(update)
    }
}

/// A record handed to the stream sink
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub partition_key: String,
    pub data: Bytes,
}

/// Last known (or historical) position of a tracked device
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePosition {
    pub device_id: String,
    /// `[longitude, latitude]`
    pub position: [f64; 2],
    pub sample_time: DateTime<Utc>,
}

impl From<PositionUpdate> for DevicePosition {
    fn from(update: PositionUpdate) -> Self {
        Self {
            device_id: update.device_id,
            position: update.position,
            sample_time: update.time,
        }
    }
}

/// Trait for publishing position records to a data stream
///
/// Implementations should publish every record of the batch and fail if any
/// record could not be delivered.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PositionSink: Send + Sync {
    async fn put_records(&self, records: Vec<PositionRecord>) -> DomainResult<()>;
}

/// Repository trait for tracker reads and writes
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DevicePositionRepository: Send + Sync {
    /// Record a position update against the tracker
    async fn record_position(&self, position: DevicePosition) -> DomainResult<()>;

    /// Latest position of every device in the tracker
    async fn list_device_positions(&self) -> DomainResult<Vec<DevicePosition>>;

    /// Positions of one device sampled at or after `since`, oldest first
    async fn get_device_position_history(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<DevicePosition>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_payload_shape() {
        let sample = PositionSample::new("Truck-1", -122.32964, 47.550247, "1");
        let time = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let record = sample.to_record(time).unwrap();

        assert_eq!(record.partition_key, "1");
        let json: serde_json::Value = serde_json::from_slice(&record.data).unwrap();
        assert_eq!(json["DeviceId"], "Truck-1");
        assert_eq!(json["Position"][0], -122.32964);
        assert_eq!(json["Position"][1], 47.550247);
        assert_eq!(json["Time"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_position_update_rejects_empty_device() {
        let data = br#"{"DeviceId":"","Position":[0.0,0.0],"Time":"2024-05-01T12:00:00Z"}"#;
        assert!(matches!(
            PositionUpdate::from_json(data),
            Err(DomainError::InvalidPositionRecord(_))
        ));
    }
}
