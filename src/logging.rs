use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, error, info, info_span, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const LOG_DIR: &str = "storage/logs";

/// Logs every request with a request id, which is echoed back in `x-request-id`.
///
/// An incoming `x-request-id` is reused so ids can be correlated across proxies.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

    let span = info_span!("request", request_id = %request_id, method = %method, path = %matched_path);

    let mut response = async {
        info!("Incoming request");
        next.run(req).await
    }
    .instrument(span.clone())
    .await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    span.in_scope(|| match status {
        400..=499 => warn!(status, latency_ms, "Client error"),
        500..=599 => error!(status, latency_ms, "Server error"),
        _ => info!(status, latency_ms, "Request completed"),
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Installs the global subscriber: a compact console layer filtered by
/// `RUST_LOG`, a daily rolling error log and a daily rolling JSON log under
/// `storage/logs`.
pub fn init_tracing() -> std::io::Result<()> {
    std::fs::create_dir_all(LOG_DIR)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,educa_cli=info,tower_http=warn,sqlx=warn",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "educa.log"))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "educa.json"))
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .init();

    info!(log_dir = LOG_DIR, "Tracing initialized");

    Ok(())
}
