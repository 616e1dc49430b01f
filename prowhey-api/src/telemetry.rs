//! Process-wide logging init (SPEC_FULL.md §4.9.1).
//!
//! `tracing` + `tracing-subscriber` only: no OTLP exporter, no metrics
//! pipeline. Analytics/metrics dashboards are explicitly out of scope
//! (spec.md Non-goals), so there is nothing downstream to export to.

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
    pub json_format: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "prowhey-api".to_string(),
            environment: "development".to_string(),
            json_format: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        let environment = std::env::var("PROWHEY_ENV").unwrap_or(default.environment);
        let json_format = environment != "development";
        Self {
            service_name: std::env::var("PROWHEY_SERVICE_NAME").unwrap_or(default.service_name),
            environment,
            json_format,
        }
    }
}

/// Initialize the global `tracing` subscriber. Call once, at process start.
pub fn init_logging(config: &TelemetryConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "logging initialized"
    );
}
