//! # staging-api: Axum HTTP Boundary for LDR Staging
//!
//! Serves the staging tree read-only over HTTP. Handlers parse the raw
//! request path into an address, run the resolution pipeline from
//! `staging-core` on the blocking pool, and wrap the result in a response
//! envelope. Content, PREMIS and technical metadata are served as
//! attachments.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                   |
//! |------------------------|--------------------------|
//! | `/v1/stages/*`         | [`routes::stages`]       |
//! | `/openapi.json`        | [`openapi`]              |
//! | `/health/*`            | liveness and readiness   |
//! | `/metrics`             | Prometheus scrape        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## Crate Policy
//!
//! - No resolution logic in handlers; it lives in `staging-core`.
//! - All failures render as a `fail` envelope via `AppError`.

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::Extension;
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use staging_core::StagingError;
use tower_http::trace::TraceLayer;

use crate::extractors::STAGES_PREFIX;
use crate::middleware::metrics::ApiMetrics;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics = if state.metrics_enabled {
        match ApiMetrics::new() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::error!(error = %e, "metrics registry could not be built; metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let mut api = Router::new()
        .merge(routes::stages::router())
        .merge(openapi::router())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(fallback);

    if let Some(metrics) = &metrics {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api.layer(TraceLayer::new_for_http()).with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if let Some(metrics) = metrics {
        probes = probes
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }
    let probes = probes.method_not_allowed_fallback(method_not_allowed);

    Router::new().merge(probes.with_state(state)).merge(api)
}

/// Unrouted paths still answer with a `fail` envelope.
async fn fallback(uri: Uri) -> AppError {
    if uri.path().starts_with(STAGES_PREFIX) {
        AppError::Staging(StagingError::InvalidAddress(format!(
            "no resource at {}",
            uri.path()
        )))
    } else {
        AppError::UnknownRoute(uri.path().to_string())
    }
}

/// Routed paths answered with a method they do not declare.
async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method.to_string())
}

/// GET /metrics: Prometheus metrics scrape endpoint.
async fn prometheus_metrics(Extension(metrics): Extension<ApiMetrics>) -> impl IntoResponse {
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" once the staging root can be listed.
async fn readiness(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    if state.store_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "staging root unavailable").into_response()
    }
}
