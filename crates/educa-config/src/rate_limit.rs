//! Rate limiting configuration for the login endpoint.
//!
//! Login attempts are limited per client IP with a token bucket (the `governor`
//! crate). Tokens are replenished at `login_per_minute` and at most
//! `login_burst` attempts can be made back to back.
//!
//! The client IP is the socket peer. `X-Forwarded-For` / `X-Real-IP` are only
//! honoured when `trust_proxy_headers` is set, i.e. when the server sits behind
//! a reverse proxy that overwrites them.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: Enable the limiter (default: `true`)
//! - `RATE_LIMIT_LOGIN_PER_MINUTE`: Replenishment rate (default: 10)
//! - `RATE_LIMIT_LOGIN_BURST`: Bucket size (default: 5)
//! - `RATE_LIMIT_TRUST_PROXY`: Key on proxy headers instead of the peer (default: `false`)

use std::num::NonZeroU32;

use governor::Quota;

use crate::env_flag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub login_per_minute: u32,
    pub login_burst: u32,
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login_per_minute: 10,
            login_burst: 5,
            trust_proxy_headers: false,
        }
    }
}

impl RateLimitConfig {
    /// A configuration with rate limiting switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            login_per_minute: std::env::var("RATE_LIMIT_LOGIN_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.login_per_minute),
            login_burst: std::env::var("RATE_LIMIT_LOGIN_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.login_burst),
            trust_proxy_headers: env_flag("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy_headers),
        }
    }

    /// Quota for the login limiter. Zero values are raised to one.
    #[must_use]
    pub fn login_quota(&self) -> Quota {
        let per_minute = NonZeroU32::new(self.login_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.login_burst).unwrap_or(NonZeroU32::MIN);

        Quota::per_minute(per_minute).allow_burst(burst)
    }
}
