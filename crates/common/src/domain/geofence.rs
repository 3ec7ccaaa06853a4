use crate::domain::result::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A named polygonal region in a geofence collection
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    pub geofence_id: String,
    /// Closed exterior ring of `[longitude, latitude]` vertices
    pub polygon: Vec<[f64; 2]>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// Input for creating or replacing a geofence
#[derive(Debug, Clone, PartialEq)]
pub struct PutGeofenceInput {
    pub geofence_id: String,
    pub polygon: Vec<[f64; 2]>,
}

/// Twice the signed area of a ring (shoelace formula). Positive when the
/// vertices wind counter-clockwise.
pub fn signed_double_area(ring: &[[f64; 2]]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += ring[i][0] * ring[j][1];
        area -= ring[j][0] * ring[i][1];
    }
    area
}

/// Orient a ring counter-clockwise, the winding geofence collections accept
pub fn ensure_counter_clockwise(mut ring: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    if signed_double_area(&ring) <= 0.0 {
        ring.reverse();
    }
    ring
}

/// Close the ring if needed and check it has at least three distinct vertices
/// enclosing a non-zero area. Repeated consecutive vertices are dropped.
pub fn validate_ring(mut ring: Vec<[f64; 2]>) -> DomainResult<Vec<[f64; 2]>> {
    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    if ring.len() < 3 {
        return Err(DomainError::InvalidGeofence(format!(
            "a geofence must have at least 3 points, got {}",
            ring.len()
        )));
    }
    if signed_double_area(&ring) == 0.0 {
        return Err(DomainError::InvalidGeofence(
            "a geofence must enclose a non-zero area".to_string(),
        ));
    }

    let first = ring[0];
    ring.push(first);
    Ok(ring)
}

/// Repository trait for the geofence collection
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GeofenceRepository: Send + Sync {
    /// List every geofence in the collection, oldest first
    async fn list_geofences(&self) -> DomainResult<Vec<Geofence>>;

    /// Create a geofence. Fails with GeofenceAlreadyExists on id conflict.
    async fn put_geofence(&self, input: PutGeofenceInput) -> DomainResult<Geofence>;

    /// Delete the given geofences, ignoring ids that do not exist
    async fn batch_delete_geofences(&self, geofence_ids: &[String]) -> DomainResult<()>;
}
