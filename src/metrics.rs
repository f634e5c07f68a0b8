//! Prometheus metrics.
//!
//! The recorder is installed only when `OBSERVABILITY_ENABLED` is not switched
//! off; every helper below is a no-op otherwise. The exporter is served by a
//! separate listener on `METRICS_PORT`.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::warn;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "off"))
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// Returns `None` when observability is disabled or the recorder cannot be
/// installed (for example because one is already installed).
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )
        .and_then(|builder| builder.install_recorder())
        .map_err(|e| warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(latency);
    counter!("http_requests_by_status", "status_category" => status_category(status))
        .increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

fn status_category(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn record_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn record_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
        .increment(1);
}

pub fn record_rate_limited(endpoint: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("rate_limited_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn record_submission_created(late: bool) {
    if !is_observability_enabled() {
        return;
    }
    let timing = if late { "late" } else { "on_time" };
    counter!("submissions_created_total", "timing" => timing).increment(1);
}

/// Records a grade as a fraction of the task's maximum score.
pub fn record_submission_graded(score: f64, max_score: f64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("submissions_graded_total").increment(1);
    if max_score > 0.0 {
        histogram!("submission_score_ratio").record(score / max_score);
    }
}

pub fn record_achievement_awarded(points: i32) {
    if !is_observability_enabled() {
        return;
    }
    counter!("achievements_awarded_total").increment(1);
    counter!("achievement_points_awarded_total").increment(u64::try_from(points).unwrap_or(0));
}
