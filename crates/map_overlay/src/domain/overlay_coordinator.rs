use crate::domain::{partition_geofences, GeofencePartition, GeofenceService, RenderedOverlay};
use common::domain::{BreachingSet, DomainResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Keeps the rendered geofence overlay in step with the catalog and the
/// breaching set.
///
/// The partition is recomputed from scratch on every render; nothing is
/// patched incrementally.
pub struct OverlayCoordinator {
    geofence_service: Arc<GeofenceService>,
    breaching_set: Arc<BreachingSet>,
    visible: AtomicBool,
    current: watch::Sender<RenderedOverlay>,
}

impl OverlayCoordinator {
    pub fn new(geofence_service: Arc<GeofenceService>, breaching_set: Arc<BreachingSet>) -> Self {
        let (current, _) = watch::channel(RenderedOverlay::render(&GeofencePartition::default(), true));
        Self {
            geofence_service,
            breaching_set,
            visible: AtomicBool::new(true),
            current,
        }
    }

    /// Re-read the displayed geofences and breaching ids and render both layers.
    ///
    /// Only the displayed (newest `MAX_DISPLAYED_GEOFENCES`) geofences are
    /// partitioned; older ones appear in neither layer.
    pub async fn refresh(&self) -> DomainResult<RenderedOverlay> {
        let displayed = self.geofence_service.list_displayed().await?;
        let breaching_ids = self.breaching_set.breaching_geofence_ids().await;

        let partition = partition_geofences(&displayed.geofences, &breaching_ids);
        let overlay = RenderedOverlay::render(&partition, self.visible.load(Ordering::Acquire));

        debug!(
            breaching = partition.breaching.len(),
            non_breaching = partition.non_breaching.len(),
            total = displayed.total,
            "rendered geofence overlay"
        );
        self.current.send_replace(overlay.clone());
        Ok(overlay)
    }

    /// Latest rendered overlay
    pub fn current(&self) -> RenderedOverlay {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderedOverlay> {
        self.current.subscribe()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
        self.current.send_modify(|overlay| overlay.visible = visible);
    }

    /// Render on start, on every breaching-set change and every `refresh_interval`
    pub async fn run(&self, refresh_interval: Duration, ctx: CancellationToken) -> anyhow::Result<()> {
        anyhow::ensure!(!refresh_interval.is_zero(), "overlay refresh interval must be non-zero");
        info!(
            refresh_interval_ms = refresh_interval.as_millis(),
            "Starting overlay coordinator"
        );

        let mut changes = self.breaching_set.subscribe();
        let mut ticker = tokio::time::interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = ticker.tick() => {}
                changed = changes.changed() => {
                    if changed.is_err() {
                        warn!("breaching set closed, stopping overlay coordinator");
                        break;
                    }
                }
            }

            if let Err(e) = self.refresh().await {
                warn!(error = %e, "failed to render geofence overlay");
            }
        }

        info!("Overlay coordinator stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InMemoryGeofenceRepository;
    use common::domain::BreachEvent;

    fn event(id: &str, geofence: &str, event_type: &str) -> BreachEvent {
        let body = format!(
            r#"{{"id":"{}","detail":{{"EventType":"{}","GeofenceId":"{}","DeviceId":"Truck-1"}}}}"#,
            id, event_type, geofence
        );
        BreachEvent::from_json(body.as_bytes()).unwrap()
    }

    fn feature_ids(layer: &crate::domain::OverlayLayer) -> Vec<String> {
        layer.data["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["geofenceId"].as_str().unwrap().to_string())
            .collect()
    }

    async fn seeded_coordinator() -> (Arc<OverlayCoordinator>, Arc<BreachingSet>) {
        let service = Arc::new(GeofenceService::new(Arc::new(InMemoryGeofenceRepository::new())));
        service.seed_demo_geofences().await.unwrap();
        let breaching_set = Arc::new(BreachingSet::default());
        let coordinator = Arc::new(OverlayCoordinator::new(service, breaching_set.clone()));
        (coordinator, breaching_set)
    }

    #[tokio::test]
    async fn test_refresh_partitions_displayed_geofences() {
        let (coordinator, breaching_set) = seeded_coordinator().await;
        breaching_set.apply(&event("1", "Warehouse", "ENTER")).await;

        let overlay = coordinator.refresh().await.unwrap();

        assert_eq!(feature_ids(&overlay.breaching), vec!["Warehouse"]);
        assert_eq!(
            feature_ids(&overlay.non_breaching),
            vec!["WarehouseVicinity-South", "WarehouseVicinity-North"]
        );
        assert_eq!(coordinator.current(), overlay);
    }

    #[tokio::test]
    async fn test_set_visible_updates_current_overlay() {
        let (coordinator, _) = seeded_coordinator().await;
        coordinator.refresh().await.unwrap();

        coordinator.set_visible(false);

        assert!(coordinator.current().visible_layers().is_empty());
        assert!(!coordinator.refresh().await.unwrap().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_rerenders_on_breach_change() {
        let (coordinator, breaching_set) = seeded_coordinator().await;
        let mut overlays = coordinator.subscribe();
        let ctx = CancellationToken::new();

        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            let ctx = ctx.clone();
            async move { coordinator.run(Duration::from_secs(3600), ctx).await }
        });

        overlays.changed().await.unwrap();
        assert!(feature_ids(&overlays.borrow_and_update().breaching).is_empty());

        breaching_set.apply(&event("1", "WarehouseVicinity-North", "ENTER")).await;
        overlays.changed().await.unwrap();
        assert_eq!(
            feature_ids(&overlays.borrow_and_update().breaching),
            vec!["WarehouseVicinity-North"]
        );

        breaching_set.apply(&event("2", "WarehouseVicinity-North", "EXIT")).await;
        overlays.changed().await.unwrap();
        assert!(feature_ids(&overlays.borrow_and_update().breaching).is_empty());

        ctx.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_geofences_beyond_displayed_are_in_neither_layer() {
        let service = Arc::new(GeofenceService::new(Arc::new(InMemoryGeofenceRepository::new())));
        let square = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for i in 0..12 {
            service
                .create_geofence(square.clone(), Some(format!("Zone-{}", i)))
                .await
                .unwrap();
        }
        let breaching_set = Arc::new(BreachingSet::default());
        breaching_set.apply(&event("1", "Zone-0", "ENTER")).await;
        breaching_set.apply(&event("2", "Zone-11", "ENTER")).await;
        let coordinator = OverlayCoordinator::new(service, breaching_set);

        let overlay = coordinator.refresh().await.unwrap();

        assert_eq!(feature_ids(&overlay.breaching), vec!["Zone-11"]);
        let non_breaching = feature_ids(&overlay.non_breaching);
        assert_eq!(non_breaching.len(), 9);
        assert!(!non_breaching.contains(&"Zone-0".to_string()));
        assert!(!non_breaching.contains(&"Zone-1".to_string()));
    }

    #[tokio::test]
    async fn test_zero_refresh_interval_is_rejected() {
        let (coordinator, _) = seeded_coordinator().await;

        let result = coordinator
            .run(Duration::ZERO, CancellationToken::new())
            .await;

        assert!(result.is_err());
    }
}
