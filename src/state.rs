use sqlx::PgPool;

use educa_config::{CookieConfig, CorsConfig, JwtConfig, RateLimitConfig};
use educa_db::init_db_pool;

use crate::middleware::rate_limit::LoginRateLimiter;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cookie_config: CookieConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cookie_config: CookieConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        let login_limiter = LoginRateLimiter::new(&rate_limit_config);

        Self {
            db,
            jwt_config,
            cookie_config,
            cors_config,
            rate_limit_config,
            login_limiter,
        }
    }
}

pub async fn init_app_state() -> AppState {
    AppState::new(
        init_db_pool().await,
        JwtConfig::from_env(),
        CookieConfig::from_env(),
        CorsConfig::from_env(),
        RateLimitConfig::from_env(),
    )
}
