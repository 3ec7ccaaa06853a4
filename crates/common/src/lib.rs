pub mod domain;
pub mod nats;
pub mod telemetry;

pub use domain::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDevicePositionRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockGeofenceRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMessageQueue;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockPositionSink;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamPublisher;
