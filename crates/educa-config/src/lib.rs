//! # Educa Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT signing secret and token lifetime
//! - [`cookie`]: Authentication cookie attributes
//! - [`cors`]: Allowed CORS origins
//! - [`rate_limit`]: Login rate limiting
//!
//! ```ignore
//! use educa_config::{CookieConfig, CorsConfig, JwtConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cookie_config = CookieConfig::from_env();
//! ```

pub mod cookie;
pub mod cors;
pub mod jwt;
pub mod rate_limit;

pub use cookie::CookieConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;

/// Parses a boolean flag the way the deployment scripts write them.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads a boolean flag from the environment, falling back to `default`
/// when it is unset or unparseable.
#[must_use]
pub fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_spellings() {
        for on in ["1", "true", "YES", " on "] {
            assert_eq!(parse_flag(on), Some(true), "{on}");
        }
        for off in ["0", "False", "no", "OFF"] {
            assert_eq!(parse_flag(off), Some(false), "{off}");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_env_flag_defaults_when_unset() {
        assert!(env_flag("EDUCA_TEST_FLAG_THAT_IS_NEVER_SET", true));
        assert!(!env_flag("EDUCA_TEST_FLAG_THAT_IS_NEVER_SET", false));
    }
}
