use crate::domain::result::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Direction of a geofence breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreachEventType {
    Enter,
    Exit,
}

impl BreachEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachEventType::Enter => "ENTER",
            BreachEventType::Exit => "EXIT",
        }
    }
}

impl std::str::FromStr for BreachEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTER" => Ok(BreachEventType::Enter),
            "EXIT" => Ok(BreachEventType::Exit),
            other => Err(DomainError::UnknownBreachEventType(other.to_string())),
        }
    }
}

/// A device entering or leaving a geofence, as delivered by the event pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct BreachEvent {
    /// Identity used for duplicate detection
    pub event_id: String,
    pub device_id: String,
    pub geofence_id: String,
    pub event_type: BreachEventType,
    pub sample_time: Option<DateTime<Utc>>,
    /// `[longitude, latitude]`
    pub position: Option<[f64; 2]>,
}

impl BreachEvent {
    /// Parse an event-bus envelope (`{"id": ..., "detail": {...}}`) into a breach event
    pub fn from_json(body: &[u8]) -> DomainResult<Self> {
        let envelope: EventEnvelope = serde_json::from_slice(body)?;

        if envelope.id.is_empty() {
            return Err(DomainError::InvalidBreachEvent(
                "event id must not be empty".to_string(),
            ));
        }
        if envelope.detail.geofence_id.is_empty() {
            return Err(DomainError::InvalidBreachEvent(format!(
                "event {} has no geofence id",
                envelope.id
            )));
        }

        Ok(Self {
            event_id: envelope.id,
            device_id: envelope.detail.device_id,
            geofence_id: envelope.detail.geofence_id,
            event_type: envelope.detail.event_type.parse()?,
            sample_time: envelope.detail.sample_time,
            position: envelope.detail.position,
        })
    }
}

impl fmt::Display for BreachEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event_type {
            BreachEventType::Enter => write!(
                f,
                "Device {} has entered {}",
                self.device_id, self.geofence_id
            ),
            BreachEventType::Exit => {
                write!(f, "Device {} has left {}", self.device_id, self.geofence_id)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    detail: EventDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EventDetail {
    event_type: String,
    geofence_id: String,
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    sample_time: Option<DateTime<Utc>>,
    #[serde(default)]
    position: Option<[f64; 2]>,
}
