use common::domain::{BreachTrackingMode, ReceiveOptions};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream carrying geofence breach events
    #[serde(default = "default_breach_events_stream")]
    pub breach_events_stream: String,

    /// Subject filter for the breach event queue consumer
    #[serde(default = "default_breach_events_subject")]
    pub breach_events_subject: String,

    /// Durable consumer name for the breach event queue
    #[serde(default = "default_breach_events_consumer_name")]
    pub breach_events_consumer_name: String,

    /// JetStream stream carrying device position updates
    #[serde(default = "default_positions_stream")]
    pub positions_stream: String,

    /// Base subject demo positions are published under (`<subject>.<partition key>`)
    #[serde(default = "default_positions_subject")]
    pub positions_subject: String,

    /// Subject filter for the tracker's position consumer
    #[serde(default = "default_positions_filter_subject")]
    pub positions_filter_subject: String,

    /// Durable consumer name for the tracker's position consumer
    #[serde(default = "default_positions_consumer_name")]
    pub positions_consumer_name: String,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Queue polling
    /// Time between breach notification poll cycles in milliseconds
    #[serde(default = "default_queue_poll_interval_ms")]
    pub queue_poll_interval_ms: u64,

    /// Maximum messages received per cycle
    #[serde(default = "default_queue_batch_size")]
    pub queue_batch_size: usize,

    /// Seconds a received message stays hidden before redelivery
    #[serde(default = "default_queue_visibility_timeout_secs")]
    pub queue_visibility_timeout_secs: u64,

    /// Seconds a receive waits for messages
    #[serde(default = "default_queue_wait_time_secs")]
    pub queue_wait_time_secs: u64,

    /// per_geofence or per_device
    #[serde(default)]
    pub breach_tracking_mode: BreachTrackingMode,

    // Demo feed
    /// Time between demo steps in milliseconds
    #[serde(default = "default_demo_interval_ms")]
    pub demo_interval_ms: u64,

    /// Run the built-in demo once at startup
    #[serde(default)]
    pub demo_on_start: bool,

    // Map overlay
    /// Seed the warehouse demo geofences at startup
    #[serde(default = "default_seed_demo_geofences")]
    pub seed_demo_geofences: bool,

    /// Seconds between overlay re-renders when nothing changed
    #[serde(default = "default_overlay_refresh_interval_secs")]
    pub overlay_refresh_interval_secs: u64,

    /// How far back device position history reaches, in seconds
    #[serde(default = "default_device_history_offset_secs")]
    pub device_history_offset_secs: u64,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default)]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_breach_events_stream() -> String {
    "geofence_events".to_string()
}

fn default_breach_events_subject() -> String {
    "geofence_events.>".to_string()
}

fn default_breach_events_consumer_name() -> String {
    "notification-reconciler".to_string()
}

fn default_positions_stream() -> String {
    "positions".to_string()
}

fn default_positions_subject() -> String {
    "positions.updates".to_string()
}

fn default_positions_filter_subject() -> String {
    "positions.>".to_string()
}

fn default_positions_consumer_name() -> String {
    "tracker-position-ingester".to_string()
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// Queue defaults
fn default_queue_poll_interval_ms() -> u64 {
    1000
}

fn default_queue_batch_size() -> usize {
    10
}

fn default_queue_visibility_timeout_secs() -> u64 {
    20
}

fn default_queue_wait_time_secs() -> u64 {
    5
}

// Demo defaults
fn default_demo_interval_ms() -> u64 {
    5000
}

// Map overlay defaults
fn default_seed_demo_geofences() -> bool {
    true
}

fn default_overlay_refresh_interval_secs() -> u64 {
    30
}

fn default_device_history_offset_secs() -> u64 {
    3600
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "geotrack-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(Environment::with_prefix("GEOTRACK"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("queue_poll_interval_ms", self.queue_poll_interval_ms),
            ("queue_batch_size", self.queue_batch_size as u64),
            ("queue_visibility_timeout_secs", self.queue_visibility_timeout_secs),
            ("demo_interval_ms", self.demo_interval_ms),
            ("overlay_refresh_interval_secs", self.overlay_refresh_interval_secs),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Message(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    pub fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: self.queue_batch_size,
            visibility_timeout: Duration::from_secs(self.queue_visibility_timeout_secs),
            wait_time: Duration::from_secs(self.queue_wait_time_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "GEOTRACK_LOG_LEVEL",
        "GEOTRACK_QUEUE_BATCH_SIZE",
        "GEOTRACK_BREACH_TRACKING_MODE",
        "GEOTRACK_DEMO_ON_START",
        "GEOTRACK_QUEUE_POLL_INTERVAL_MS",
        "GEOTRACK_QUEUE_VISIBILITY_TIMEOUT_SECS",
        "GEOTRACK_DEMO_INTERVAL_MS",
        "GEOTRACK_OVERLAY_REFRESH_INTERVAL_SECS",
    ];

    fn clear_vars() {
        for var in VARS {
            // SAFETY: Test runs with mutex lock to prevent concurrent env access
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_vars();

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.queue_poll_interval_ms, 1000);
        assert_eq!(config.demo_interval_ms, 5000);
        assert_eq!(config.device_history_offset_secs, 3600);
        assert_eq!(config.breach_tracking_mode, BreachTrackingMode::PerGeofence);
        assert!(!config.demo_on_start);
        assert_eq!(config.receive_options(), ReceiveOptions::default());
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("GEOTRACK_LOG_LEVEL", "debug");
            std::env::set_var("GEOTRACK_QUEUE_BATCH_SIZE", "5");
            std::env::set_var("GEOTRACK_BREACH_TRACKING_MODE", "per_device");
            std::env::set_var("GEOTRACK_DEMO_ON_START", "true");
        }

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.receive_options().max_messages, 5);
        assert_eq!(config.breach_tracking_mode, BreachTrackingMode::PerDevice);
        assert!(config.demo_on_start);

        clear_vars();
    }

    fn assert_zero_rejected(var: &str, field: &str) {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_vars();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var(var, "0");
        }

        let result = ServiceConfig::from_env();
        clear_vars();

        match result {
            Err(ConfigError::Message(message)) => assert!(message.contains(field), "{}", message),
            other => panic!("expected {} to be rejected, got {:?}", field, other),
        }
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert_zero_rejected("GEOTRACK_QUEUE_POLL_INTERVAL_MS", "queue_poll_interval_ms");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert_zero_rejected("GEOTRACK_QUEUE_BATCH_SIZE", "queue_batch_size");
    }

    #[test]
    fn test_zero_visibility_timeout_rejected() {
        assert_zero_rejected(
            "GEOTRACK_QUEUE_VISIBILITY_TIMEOUT_SECS",
            "queue_visibility_timeout_secs",
        );
    }

    #[test]
    fn test_zero_demo_interval_rejected() {
        assert_zero_rejected("GEOTRACK_DEMO_INTERVAL_MS", "demo_interval_ms");
    }

    #[test]
    fn test_zero_overlay_refresh_interval_rejected() {
        assert_zero_rejected(
            "GEOTRACK_OVERLAY_REFRESH_INTERVAL_SECS",
            "overlay_refresh_interval_secs",
        );
    }
}
