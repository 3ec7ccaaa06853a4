mod demo_geofences;
mod geofence_partition;
mod geofence_service;
mod in_memory_device_position_repository;
mod in_memory_geofence_repository;
mod overlay_coordinator;
mod overlay_layer;
mod position_ingester;
mod tracker_service;

pub use demo_geofences::*;
pub use geofence_partition::*;
pub use geofence_service::*;
pub use in_memory_device_position_repository::*;
pub use in_memory_geofence_repository::*;
pub use overlay_coordinator::*;
pub use overlay_layer::*;
pub use position_ingester::*;
pub use tracker_service::*;
