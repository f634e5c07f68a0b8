use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use educa_auth::{Claims, verify_token};
use educa_core::AppError;
use educa_models::Role;
use educa_models::users::{USER_COLUMNS, User};

use crate::state::AppState;

/// Extractor that validates the access token and provides the caller's claims.
///
/// The token is read from the authentication cookie first and from an
/// `Authorization: Bearer` header otherwise. Only the signature and expiry are
/// checked; use [`CurrentUser`] when the user row itself is needed.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// The authenticated caller reduced to what authorization decisions need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn role(&self) -> Result<Role, AppError> {
        self.0
            .role
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid role in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn actor(&self) -> Result<Actor, AppError> {
        Ok(Actor {
            id: self.user_id()?,
            role: self.role()?,
        })
    }
}

/// Returns the raw token from the named cookie or, failing that, the bearer header.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by the role middleware when it already verified the token.
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let token = token_from_headers(&parts.headers, &state.cookie_config.name)
            .ok_or_else(|| AppError::unauthorized("Missing authentication token"))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Extractor that loads the authenticated user's row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let user_id = auth_user.user_id()?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !user.active {
            return Err(AppError::forbidden("User account is inactive"));
        }

        Ok(CurrentUser(user))
    }
}
