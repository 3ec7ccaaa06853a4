use common::domain::Geofence;
use std::collections::BTreeSet;

/// Geofences split by whether they are currently breached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeofencePartition {
    pub breaching: Vec<Geofence>,
    pub non_breaching: Vec<Geofence>,
}

impl GeofencePartition {
    pub fn len(&self) -> usize {
        self.breaching.len() + self.non_breaching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `geofences` into breaching and non-breaching subsets.
///
/// Every geofence lands in exactly one subset and each subset keeps the input
/// order. Ids in `breaching_ids` without a matching geofence are ignored.
pub fn partition_geofences(
    geofences: &[Geofence],
    breaching_ids: &BTreeSet<String>,
) -> GeofencePartition {
    let (breaching, non_breaching) = geofences
        .iter()
        .cloned()
        .partition(|geofence| breaching_ids.contains(&geofence.geofence_id));

    GeofencePartition {
        breaching,
        non_breaching,
    }
}
