//! Token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use educa_config::JwtConfig;
use educa_core::AppError;

use crate::claims::Claims;

/// Creates a signed access token for `user_id`.
///
/// The token expires `jwt_config.access_token_expiry` seconds from now.
///
/// # Errors
///
/// Returns an internal error if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies the signature and expiry of an access token and returns its claims.
///
/// # Errors
///
/// Returns `401 Unauthorized` when the token is malformed, signed with another
/// secret, or expired.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}
