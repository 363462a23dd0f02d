use opentelemetry::metrics::Meter;
use opentelemetry::{KeyValue, global};
use tracing::Span;

use crate::context::TelemetryLabels;

/// Instrumentation scope of every Nomios counter.
pub const METER_NAME: &str = "nomios";

pub const WEBHOOKS_RECEIVED: &str = "nomios_webhooks_received_total";
pub const WEBHOOKS_SKIPPED: &str = "nomios_webhooks_skipped_total";
pub const EVENTS_DISPATCHED: &str = "nomios_events_dispatched_total";
pub const DISPATCH_FAILURES: &str = "nomios_dispatch_failures_total";
pub const PIPELINES_STARTED: &str = "nomios_pipelines_started_total";

/// Records the common webhook fields on a span declared with them as `Empty`.
pub fn with_common_fields(span: &Span, provider: &str, event_uri: Option<&str>) {
    span.record("provider", tracing::field::display(provider));
    if let Some(uri) = event_uri {
        span.record("event_uri", tracing::field::display(uri));
    }
}

/// Adds `value` to counter `name` on the global meter provider.
///
/// Without an installed provider (telemetry disabled) the global meter is a no-op.
pub fn record_counter(name: &'static str, value: u64, labels: &TelemetryLabels) {
    record_on(&global::meter(METER_NAME), name, value, labels);
}

fn record_on(meter: &Meter, name: &'static str, value: u64, labels: &TelemetryLabels) {
    let attributes: Vec<KeyValue> = labels
        .tags()
        .into_iter()
        .map(|(k, v)| KeyValue::new(k, v))
        .collect();
    meter.u64_counter(name).build().add(value, &attributes);
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    use super::*;

    #[test]
    fn counters_reach_the_meter_provider() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let meter = provider.meter(METER_NAME);

        let labels = TelemetryLabels::new("quay");
        record_on(&meter, WEBHOOKS_RECEIVED, 1, &labels);
        record_on(&meter, WEBHOOKS_RECEIVED, 2, &labels);
        provider.force_flush().unwrap();

        let exported = exporter.get_finished_metrics().unwrap();
        let metric = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics())
            .flat_map(|sm| sm.metrics())
            .find(|m| m.name() == WEBHOOKS_RECEIVED)
            .expect("counter exported");
        let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() else {
            panic!("unexpected aggregation for {}", metric.name());
        };
        let point = sum.data_points().next().expect("one data point");
        assert_eq!(point.value(), 3);
        let keys: Vec<_> = point.attributes().map(|kv| kv.key.as_str().to_string()).collect();
        assert_eq!(keys, vec!["provider"]);
    }
}
