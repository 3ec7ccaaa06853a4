use crate::domain::{BreachEvent, BreachEventType};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// How breaches are attributed when several devices share a geofence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachTrackingMode {
    /// Any EXIT clears the geofence, even if another device is still inside it
    #[default]
    PerGeofence,
    /// A geofence stays breached while at least one device is inside it
    PerDevice,
}

/// The set of geofences currently breached by at least one device.
///
/// Written by the notification reconciler, read by overlay rendering through
/// snapshots. Every change to the set of breached ids bumps a version on a
/// watch channel so readers can re-render.
pub struct BreachingSet {
    mode: BreachTrackingMode,
    // geofence id -> devices observed inside it
    geofences: RwLock<BTreeMap<String, BTreeSet<String>>>,
    version: watch::Sender<u64>,
}

impl BreachingSet {
    pub fn new(mode: BreachTrackingMode) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            mode,
            geofences: RwLock::new(BTreeMap::new()),
            version,
        }
    }

    pub fn mode(&self) -> BreachTrackingMode {
        self.mode
    }

    /// Apply an ENTER/EXIT event. Returns true when the set of breached ids changed.
    pub async fn apply(&self, event: &BreachEvent) -> bool {
        let mut geofences = self.geofences.write().await;

        let changed = match (event.event_type, self.mode) {
            (BreachEventType::Enter, _) => {
                let devices = geofences.entry(event.geofence_id.clone()).or_default();
                let was_empty = devices.is_empty();
                devices.insert(event.device_id.clone());
                was_empty
            }
            (BreachEventType::Exit, BreachTrackingMode::PerGeofence) => {
                geofences.remove(&event.geofence_id).is_some()
            }
            (BreachEventType::Exit, BreachTrackingMode::PerDevice) => {
                match geofences.get_mut(&event.geofence_id) {
                    Some(devices) => {
                        devices.remove(&event.device_id);
                        if devices.is_empty() {
                            geofences.remove(&event.geofence_id);
                            true
                        } else {
                            false
                        }
                    }
                    None => false,
                }
            }
        };
        drop(geofences);

        if changed {
            debug!(
                geofence_id = %event.geofence_id,
                device_id = %event.device_id,
                event_type = event.event_type.as_str(),
                "breaching set changed"
            );
            self.version.send_modify(|v| *v += 1);
        }

        changed
    }

    /// Read-only snapshot of the breached geofence ids
    pub async fn breaching_geofence_ids(&self) -> BTreeSet<String> {
        self.geofences.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, geofence_id: &str) -> bool {
        self.geofences.read().await.contains_key(geofence_id)
    }

    /// Receiver that is marked changed whenever the breached ids change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl Default for BreachingSet {
    fn default() -> Self {
        Self::new(BreachTrackingMode::default())
    }
}
