use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use crate::rekognition::UpstreamError;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::future::Future;
use std::time::Instant;

pub struct Metrics {
    request_counter: Counter<u64>,
    upstream_duration: Histogram<u64>,
    upstream_failures: Counter<u64>,
    skipped_images: Counter<u64>,
    // Held so the exporter stays alive when the global provider is replaced.
    _provider: SdkMeterProvider,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build prometheus exporter: {}", e))?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("rekognition_proxy");
        global::set_meter_provider(provider.clone());

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let upstream_duration = meter
            .u64_histogram("upstream_duration_ms")
            .with_boundaries(exponential_boundaries(25.0, 2.0, 10))
            .with_description("Duration of Rekognition calls in milliseconds")
            .build();

        let upstream_failures = meter
            .u64_counter("upstream_failures_total")
            .with_description("Rekognition calls that returned an error")
            .build();

        let skipped_images = meter
            .u64_counter("skipped_images_total")
            .with_description("Batch images skipped because they were unreadable or failed detection")
            .build();

        Ok(Metrics {
            request_counter,
            upstream_duration,
            upstream_failures,
            skipped_images,
            _provider: provider,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = [KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_upstream(&self, operation: &str, duration_ms: u64, success: bool) {
        let attributes = [KeyValue::new("operation", operation.to_string())];
        self.upstream_duration.record(duration_ms, &attributes);
        if !success {
            self.upstream_failures.add(1, &attributes);
        }
    }

    /// Times one Rekognition call and records its latency and outcome.
    pub async fn observe_upstream<T, F>(&self, operation: &str, call: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        let started = Instant::now();
        let result = call.await;
        self.record_upstream(
            operation,
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        result
    }

    pub fn record_skipped_images(&self, count: u64) {
        if count > 0 {
            self.skipped_images.add(count, &[]);
        }
    }
}

/// `count` bucket bounds starting at `start`, each `factor` times the previous one.
fn exponential_boundaries(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |bound| Some(bound * factor))
        .take(count)
        .collect()
}


/// Number of exported metric families describing upstream calls.
#[cfg(test)]
pub(crate) fn upstream_families(metrics: &Metrics) -> usize {
    metrics
        .registry
        .gather()
        .iter()
        .filter(|family| family.get_name().starts_with("upstream"))
        .count()
}
