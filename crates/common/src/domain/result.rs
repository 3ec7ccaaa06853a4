use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid breach event: {0}")]
    InvalidBreachEvent(String),

    #[error("Unknown breach event type: {0}")]
    UnknownBreachEventType(String),

    #[error("Geofence not found: {0}")]
    GeofenceNotFound(String),

    #[error("Geofence already exists: {0}")]
    GeofenceAlreadyExists(String),

    #[error("Invalid geofence: {0}")]
    InvalidGeofence(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Invalid position record: {0}")]
    InvalidPositionRecord(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
