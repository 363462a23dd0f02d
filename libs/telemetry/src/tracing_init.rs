use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::SdkTracerProvider,
};
use tracing::warn;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{TelemetryConfig, TelemetryProtocol};

const METRICS_INTERVAL: Duration = Duration::from_secs(15);

/// Exporter pipelines kept alive for the life of the process.
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

static PROVIDERS: OnceLock<Providers> = OnceLock::new();
static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber. Later calls only update [`telemetry_enabled`].
pub fn init_telemetry(cfg: TelemetryConfig) -> Result<()> {
    let exporters = cfg.exporter_enabled();
    TELEMETRY_ENABLED.store(exporters, Ordering::SeqCst);
    if PROVIDERS.get().is_some() {
        return Ok(());
    }

    let providers = if exporters {
        let resource = build_resource(&cfg);
        let tracer = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(span_exporter(&cfg).context("failed to build span exporter")?)
            .build();
        let reader = PeriodicReader::builder(
            metric_exporter(&cfg).context("failed to build metric exporter")?,
        )
        .with_interval(METRICS_INTERVAL)
        .build();
        let meter = SdkMeterProvider::builder()
            .with_resource(resource)
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());
        Providers {
            tracer: Some(tracer),
            meter: Some(meter),
        }
    } else {
        Providers {
            tracer: None,
            meter: None,
        }
    };

    install_subscriber(&cfg, providers.tracer.as_ref());
    PROVIDERS.set(providers).ok();
    Ok(())
}

pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::SeqCst)
}

/// Flushes and stops the exporters, if any were started.
pub fn shutdown_telemetry() {
    let Some(providers) = PROVIDERS.get() else {
        return;
    };
    if let Some(Err(err)) = providers.tracer.as_ref().map(SdkTracerProvider::shutdown) {
        warn!(error = %err, "failed to flush spans");
    }
    if let Some(Err(err)) = providers.meter.as_ref().map(SdkMeterProvider::shutdown) {
        warn!(error = %err, "failed to flush metrics");
    }
}

fn install_subscriber(cfg: &TelemetryConfig, tracer: Option<&SdkTracerProvider>) {
    let fmt_layer = if cfg.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    let env_filter = match cfg.filter_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let otel_layer = tracer.map(|provider| {
        global::set_tracer_provider(provider.clone());
        OpenTelemetryLayer::new(provider.tracer(cfg.service_name.clone()))
    });

    // a subscriber may already be set (tests); keep it
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .ok();
}

fn span_exporter(cfg: &TelemetryConfig) -> Result<SpanExporter, opentelemetry_otlp::ExporterBuildError> {
    match cfg.protocol {
        TelemetryProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
        TelemetryProtocol::HttpProtobuf => SpanExporter::builder()
            .with_http()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
    }
}

fn metric_exporter(
    cfg: &TelemetryConfig,
) -> Result<MetricExporter, opentelemetry_otlp::ExporterBuildError> {
    match cfg.protocol {
        TelemetryProtocol::Grpc => MetricExporter::builder()
            .with_tonic()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
        TelemetryProtocol::HttpProtobuf => MetricExporter::builder()
            .with_http()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
    }
}

fn build_resource(cfg: &TelemetryConfig) -> Resource {
    Resource::builder_empty()
        .with_service_name(cfg.service_name.clone())
        .with_attributes([
            KeyValue::new("service.namespace", "nomios"),
            KeyValue::new("service.version", cfg.service_version.clone()),
            KeyValue::new("deployment.environment", cfg.environment.clone()),
        ])
        .build()
}
