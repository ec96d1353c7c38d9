//! # Prometheus Metrics
//!
//! HTTP request counts, latency and errors recorded by middleware into a
//! private Prometheus registry, served in text exposition format at
//! `/metrics`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::extractors::STAGES_PREFIX;

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("staging_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "staging_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )?;

        let http_errors_total = IntCounterVec::new(
            Opts::new("staging_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
            }),
        })
    }

    fn sum(counter: &IntCounterVec) -> u64 {
        counter
            .collect()
            .iter()
            .flat_map(|mf| mf.get_metric())
            .map(|m| m.get_counter().get_value() as u64)
            .sum()
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        Self::sum(&self.inner.http_requests_total)
    }

    /// Total error count across all labels.
    pub fn errors(&self) -> u64 {
        Self::sum(&self.inner.http_errors_total)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

/// Non-stage paths recorded under their own label.
const FIXED_PATHS: &[&str] = &[
    "/openapi.json",
    "/health/liveness",
    "/health/readiness",
    "/metrics",
];

/// Label for every path that is neither in the stage tree nor fixed.
const UNMATCHED: &str = "{unmatched}";

/// Replace identifier segments of a stage path with placeholders.
///
/// Stage, segment and suite names are unbounded, so raw paths would blow
/// up label cardinality. Any other path outside [`FIXED_PATHS`] collapses
/// into [`UNMATCHED`].
fn normalize_path(path: &str) -> String {
    let rest = match path.strip_prefix(STAGES_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ if FIXED_PATHS.contains(&path) => return path.to_string(),
        _ => return UNMATCHED.to_string(),
    };
    let mut out = String::from(STAGES_PREFIX);
    let mut expect_id: Option<&str> = None;
    for (i, segment) in rest.split('/').skip(1).enumerate() {
        out.push('/');
        let label = match (i, expect_id.take()) {
            (0, _) => "{stage_id}",
            (1, _) => "{segment_id}",
            (2, _) => "{ms_id}",
            (_, Some(placeholder)) => placeholder,
            (_, None) => match segment {
                "presforms" => {
                    expect_id = Some("{presform_id}");
                    segment
                }
                "techmds" => {
                    expect_id = Some("{techmd_id}");
                    segment
                }
                "content" | "premis" => segment,
                _ => "{unknown}",
            },
        };
        out.push_str(label);
    }
    out
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, &path, response.status().as_u16(), duration);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_metrics_new_starts_at_zero() {
        let m = ApiMetrics::new().unwrap();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn errors_count_only_4xx_and_5xx() {
        let m = ApiMetrics::new().unwrap();
        m.record_request("GET", "/v1/stages", 200, 0.01);
        m.record_request("GET", "/v1/stages/{stage_id}", 404, 0.01);
        m.record_request("POST", "/v1/stages", 501, 0.01);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn encoded_output_names_staging_metrics() {
        let m = ApiMetrics::new().unwrap();
        m.record_request("GET", "/v1/stages", 200, 0.01);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("staging_http_requests_total"));
        assert!(text.contains("staging_http_request_duration_seconds"));
    }

    #[test]
    fn normalize_path_hides_identifiers() {
        assert_eq!(normalize_path("/v1/stages"), "/v1/stages");
        assert_eq!(normalize_path("/v1/stages/s1/g1"), "/v1/stages/{stage_id}/{segment_id}");
        assert_eq!(
            normalize_path("/v1/stages/s1/g1/a%20b/presforms/p/presforms/q/techmds/t"),
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms/{presform_id}\
             /presforms/{presform_id}/techmds/{techmd_id}"
        );
        assert_eq!(
            normalize_path("/v1/stages/s/g/m/content"),
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/content"
        );
        assert_eq!(normalize_path("/health/liveness"), "/health/liveness");
    }

    #[test]
    fn unknown_paths_share_one_label() {
        for path in ["/", "/wp-admin/setup.php", "/v1/stagesX", "/v2/stages/s1", "/.env"] {
            assert_eq!(normalize_path(path), UNMATCHED, "{path}");
        }
        assert_eq!(normalize_path("/openapi.json"), "/openapi.json");
    }

    #[test]
    fn concurrent_increments_are_safe() {
        let m = ApiMetrics::new().unwrap();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.record_request("GET", "/v1/stages", 200, 0.001);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(m.requests(), 800);
    }
}
