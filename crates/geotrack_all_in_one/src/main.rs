mod config;

use common::domain::BreachingSet;
use common::nats::NatsClient;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use config::ServiceConfig;
use demo_feed::demo_feed::{DemoFeed, DemoFeedConfig};
use geotrack_runner::Runner;
use map_overlay::map_overlay::{MapOverlay, MapOverlayConfig};
use notification_reconciler::notification_reconciler::{
    NotificationReconcilerConfig, NotificationReconcilerWorker,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting geotrack-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let nats_client = match initialize_nats(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize NATS: {:#}", e);
            std::process::exit(1);
        }
    };

    // Written by the reconciler, read by the overlay
    let breaching_set = Arc::new(BreachingSet::new(config.breach_tracking_mode));

    let reconciler_worker = match NotificationReconcilerWorker::new(
        nats_client.clone(),
        breaching_set.clone(),
        NotificationReconcilerConfig {
            breach_events_stream: config.breach_events_stream.clone(),
            breach_events_subject: config.breach_events_subject.clone(),
            consumer_name: config.breach_events_consumer_name.clone(),
            poll_interval: Duration::from_millis(config.queue_poll_interval_ms),
            receive_options: config.receive_options(),
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize notification reconciler: {:#}", e);
            std::process::exit(1);
        }
    };

    let map_overlay = match MapOverlay::new(
        nats_client.clone(),
        breaching_set,
        MapOverlayConfig {
            positions_stream: config.positions_stream.clone(),
            positions_filter_subject: config.positions_filter_subject.clone(),
            positions_consumer_name: config.positions_consumer_name.clone(),
            receive_options: config.receive_options(),
            refresh_interval: Duration::from_secs(config.overlay_refresh_interval_secs),
            history_offset: Duration::from_secs(config.device_history_offset_secs),
            seed_demo_geofences: config.seed_demo_geofences,
        },
    )
    .await
    {
        Ok(overlay) => overlay,
        Err(e) => {
            error!("Failed to initialize map overlay: {:#}", e);
            std::process::exit(1);
        }
    };

    let demo_feed = DemoFeed::new(
        &nats_client,
        DemoFeedConfig {
            positions_subject: config.positions_subject.clone(),
            interval: Duration::from_millis(config.demo_interval_ms),
            run_on_start: config.demo_on_start,
        },
    );

    // A demo run starts a fresh notification session
    if config.demo_on_start {
        reconciler_worker.reconciler().reset_session().await;
    }

    let mut runner = Runner::new()
        .with_named_process(
            "notification_reconciler",
            reconciler_worker.into_runner_process(),
        )
        .with_named_process("demo_feed", demo_feed.into_runner_process());

    for (name, process) in map_overlay.into_runner_processes() {
        runner = runner.with_named_process(name, process);
    }

    runner = runner
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || {
                Box::pin(async move {
                    info!("Running cleanup tasks...");
                    if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                        client.close().await;
                    }

                    shutdown_telemetry(telemetry_providers);

                    info!("Cleanup complete");
                    Ok(())
                })
            }
        })
        .with_closer_timeout(Duration::from_secs(10));
    drop(nats_client);

    runner.run().await;
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<Arc<NatsClient>> {
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );
    ensure_nats_streams(&nats_client, config).await?;
    Ok(nats_client)
}

async fn ensure_nats_streams(client: &NatsClient, config: &ServiceConfig) -> anyhow::Result<()> {
    client
        .ensure_stream(&config.breach_events_stream, "Geofence breach events")
        .await?;
    client
        .ensure_stream(&config.positions_stream, "Device position updates")
        .await?;
    Ok(())
}
