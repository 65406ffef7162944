//! Request counting and the Prometheus exposition endpoint.
//!
//! The recorder is owned by the application rather than installed as the
//! global `metrics` recorder, so every [`Metrics`] instance has its own
//! registry. Process statistics (CPU, memory, file descriptors, threads) are
//! sampled into that registry on every scrape.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics::{Counter, counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use metrics_process::Collector;

/// Name of the request counter.
pub const REQUEST_COUNT: &str = "request_count";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Process-wide count of handled requests.
#[derive(Clone)]
pub struct RequestCounter {
    total: Arc<AtomicU64>,
    counter: Counter,
}

impl RequestCounter {
    /// Records one request and returns the new total.
    pub fn increment(&self) -> u64 {
        self.counter.increment(1);
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// Metrics registry and its exposition handle.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    process: Arc<Collector>,
    requests: RequestCounter,
}

impl Metrics {
    /// Creates a registry with the request counter registered at zero and
    /// the process metrics described.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let process = Collector::default();

        let counter = metrics::with_local_recorder(&recorder, || {
            process.describe();
            describe_counter!(REQUEST_COUNT, "No of request handled");
            counter!(REQUEST_COUNT)
        });

        Self {
            recorder: Arc::new(recorder),
            handle,
            process: Arc::new(process),
            requests: RequestCounter {
                total: Arc::new(AtomicU64::new(0)),
                counter,
            },
        }
    }

    pub fn requests(&self) -> &RequestCounter {
        &self.requests
    }

    /// Samples the process metrics and renders the registry in the
    /// Prometheus text format.
    pub fn render(&self) -> String {
        metrics::with_local_recorder(self.recorder.as_ref(), || self.process.collect());
        self.handle.render()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves the Prometheus exposition.
pub async fn serve_metrics(State(metrics): State<Metrics>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], metrics.render())
}
