//! Per-IP rate limiting for the login endpoint.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, RateLimiter};
use tracing::{debug, warn};

use educa_config::RateLimitConfig;
use educa_core::AppError;

use crate::state::AppState;

/// Keyed token-bucket limiter shared by every request handled by the server.
///
/// When rate limiting is disabled the limiter is absent and every check passes.
#[derive(Clone)]
pub struct LoginRateLimiter {
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    trust_proxy_headers: bool,
}

impl LoginRateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        let limiter = config
            .enabled
            .then(|| Arc::new(RateLimiter::keyed(config.login_quota())));

        Self {
            limiter,
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }

    /// Consumes one attempt for `key`. Returns `false` when the bucket is empty.
    pub fn check(&self, key: &str) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check_key(&key.to_string()).is_ok(),
            None => true,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Number of client keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    /// Drops keys whose buckets have refilled completely.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Prunes the limiter every `interval` on a background task.
    pub fn spawn_pruning(&self, interval: Duration) {
        if self.limiter.is_none() {
            return;
        }
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                limiter.prune();
                debug!(keys = limiter.tracked_keys(), "Login rate limiter pruned");
            }
        });
    }

    /// The key a request is limited under.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        client_ip(headers, peer, self.trust_proxy_headers)
    }
}

impl fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("enabled", &self.is_enabled())
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}

/// Client address of a request. Proxy headers are only read when
/// `trust_proxy_headers` is set; otherwise the socket peer is used.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if !trust_proxy_headers {
        return peer_ip(peer);
    }

    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return real_ip.to_string();
    }

    peer_ip(peer)
}

fn peer_ip(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = state.login_limiter.client_key(req.headers(), peer);

    if !state.login_limiter.check(&ip) {
        warn!(client_ip = %ip, "Login rate limit exceeded");
        crate::metrics::record_rate_limited("login");
        return Err(AppError::too_many_requests(anyhow::anyhow!(
            "Too many login attempts, try again later"
        )));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limited(per_minute: u32, burst: u32) -> LoginRateLimiter {
        LoginRateLimiter::new(&RateLimitConfig {
            enabled: true,
            login_per_minute: per_minute,
            login_burst: burst,
            trust_proxy_headers: false,
        })
    }

    #[test]
    fn test_burst_is_enforced_per_key() {
        let limiter = limited(1, 2);
        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));

        assert!(limiter.check("10.0.0.2"));
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = LoginRateLimiter::new(&RateLimitConfig::disabled());
        assert!(!limiter.is_enabled());
        for _ in 0..100 {
            assert!(limiter.check("10.0.0.1"));
        }
    }

    #[test]
    fn test_prune_keeps_exhausted_buckets() {
        let limiter = limited(1, 1);
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        assert_eq!(limiter.tracked_keys(), 1);

        limiter.prune();
        assert!(!limiter.check("10.0.0.1"));
    }

    fn spoofed_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        headers
    }

    #[test]
    fn test_client_ip_ignores_proxy_headers_by_default() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(client_ip(&spoofed_headers(), Some(peer), false), "192.0.2.10");
        assert_eq!(client_ip(&spoofed_headers(), None, false), "unknown");
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for_behind_proxy() {
        assert_eq!(client_ip(&spoofed_headers(), None, true), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_fallbacks_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, None, true), "198.51.100.2");

        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), "192.0.2.10");
        assert_eq!(client_ip(&HeaderMap::new(), None, true), "unknown");
    }

    #[test]
    fn test_rotating_forwarded_for_shares_the_peer_bucket() {
        let limiter = limited(1, 2);
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();

        let allowed = (0..50)
            .filter(|i| {
                let mut headers = HeaderMap::new();
                headers.insert(
                    "x-forwarded-for",
                    HeaderValue::from_str(&format!("10.9.0.{i}")).unwrap(),
                );
                limiter.check(&limiter.client_key(&headers, Some(peer)))
            })
            .count();

        assert_eq!(allowed, 2);
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
