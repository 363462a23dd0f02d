//! Logging and telemetry wiring for the Nomios services.
//!
//! `install` sets up a `tracing` subscriber (JSON or text, filtered by `RUST_LOG` or an
//! explicit level) and, when configured, an OTLP exporter for spans and metrics.
//! Counters go to the OpenTelemetry meter provider, labelled by provider only.

use anyhow::Result;

mod config;
mod context;
mod counters;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use context::TelemetryLabels;
pub use counters::{
    DISPATCH_FAILURES, EVENTS_DISPATCHED, METER_NAME, PIPELINES_STARTED, WEBHOOKS_RECEIVED,
    WEBHOOKS_SKIPPED, record_counter, with_common_fields,
};
pub use tracing_init::{init_telemetry, shutdown_telemetry, telemetry_enabled};

/// Installs the subscriber for `service_name` using environment configuration.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
