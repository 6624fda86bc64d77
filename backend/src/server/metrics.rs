//! Prometheus request metrics exposed at `/metrics`.

use std::io;

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::Registry;

const NAMESPACE: &str = "postboard";
const ENDPOINT: &str = "/metrics";

/// Middleware recording per-route request counts and latencies.
///
/// # Errors
/// Fails when the collectors cannot be registered.
pub(crate) fn request_metrics() -> io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new(NAMESPACE)
        .registry(Registry::new())
        .endpoint(ENDPOINT)
        .build()
        .map_err(|err| io::Error::other(format!("configure Prometheus metrics: {err}")))
}
