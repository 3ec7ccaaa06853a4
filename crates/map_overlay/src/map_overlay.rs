use crate::domain::{
    GeofenceService, InMemoryDevicePositionRepository, InMemoryGeofenceRepository,
    OverlayCoordinator, PositionIngester, TrackerService,
};
use common::domain::{BreachingSet, ReceiveOptions};
use common::nats::NatsClient;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub type RunnerProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;

pub struct MapOverlayConfig {
    pub positions_stream: String,
    pub positions_filter_subject: String,
    pub positions_consumer_name: String,
    pub receive_options: ReceiveOptions,
    pub refresh_interval: Duration,
    pub history_offset: Duration,
    pub seed_demo_geofences: bool,
}

pub struct MapOverlay {
    geofence_service: Arc<GeofenceService>,
    tracker_service: Arc<TrackerService>,
    coordinator: Arc<OverlayCoordinator>,
    ingester: PositionIngester,
    refresh_interval: Duration,
}

impl MapOverlay {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        breaching_set: Arc<BreachingSet>,
        config: MapOverlayConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing Map Overlay module");

        let geofence_service = Arc::new(GeofenceService::new(Arc::new(
            InMemoryGeofenceRepository::new(),
        )));
        if config.seed_demo_geofences {
            geofence_service.seed_demo_geofences().await?;
        }

        let position_repository = Arc::new(InMemoryDevicePositionRepository::with_retention(
            config.history_offset,
        ));
        let tracker_service = Arc::new(TrackerService::new(
            position_repository.clone(),
            config.history_offset,
        ));

        let queue = nats_client
            .create_message_queue(
                &config.positions_stream,
                &config.positions_consumer_name,
                &config.positions_filter_subject,
                config.receive_options.visibility_timeout,
            )
            .await?;
        let ingester = PositionIngester::new(queue, position_repository, config.receive_options);

        let coordinator = Arc::new(OverlayCoordinator::new(
            geofence_service.clone(),
            breaching_set,
        ));

        info!("Map Overlay initialized");

        Ok(Self {
            geofence_service,
            tracker_service,
            coordinator,
            ingester,
            refresh_interval: config.refresh_interval,
        })
    }

    pub fn geofence_service(&self) -> Arc<GeofenceService> {
        Arc::clone(&self.geofence_service)
    }

    pub fn tracker_service(&self) -> Arc<TrackerService> {
        Arc::clone(&self.tracker_service)
    }

    pub fn coordinator(&self) -> Arc<OverlayCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Named processes for the runner: overlay rendering and position ingestion
    pub fn into_runner_processes(self) -> Vec<(&'static str, RunnerProcess)> {
        let coordinator = self.coordinator;
        let refresh_interval = self.refresh_interval;
        let coordinator_process: RunnerProcess = Box::new(move |ctx| {
            Box::pin(async move { coordinator.run(refresh_interval, ctx).await })
        });

        let ingester = self.ingester;
        let ingester_process: RunnerProcess =
            Box::new(move |ctx| Box::pin(async move { ingester.run(ctx).await }));

        vec![
            ("overlay_coordinator", coordinator_process),
            ("position_ingester", ingester_process),
        ]
    }
}
