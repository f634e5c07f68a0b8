//! Authentication cookie configuration.
//!
//! The access token is delivered to browsers in an HTTP-only cookie. API
//! clients that cannot hold cookies may still send it as a bearer token.
//!
//! # Environment Variables
//!
//! - `AUTH_COOKIE_NAME`: Cookie name (default: `token`)
//! - `AUTH_COOKIE_SECURE`: Whether to set the `Secure` attribute (default: `false`)

use std::env;

use crate::parse_flag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "token".to_string(),
            secure: false,
        }
    }
}

impl CookieConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            name: env::var("AUTH_COOKIE_NAME")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.name),
            secure: env::var("AUTH_COOKIE_SECURE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.secure),
        }
    }
}
