use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use utoipa::ToSchema;

use educa_config::CookieConfig;
use educa_core::AppError;
use educa_models::users::User;

use crate::middleware::auth::{AuthUser, CurrentUser};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{ChangePasswordDto, LoginRequest, LoginResponse, MessageResponse};
use super::service::AuthService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn auth_cookie(config: &CookieConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .build()
}

/// Log in and receive an access token
///
/// The token is returned in the body and set in an HTTP-only cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Inactive account", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many login attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let response = AuthService::login_user(&state.db, dto, &state.jwt_config).await?;
    let jar = jar.add(auth_cookie(
        &state.cookie_config,
        response.access_token.clone(),
    ));

    Ok((jar, Json(response)))
}

/// Log out by clearing the authentication cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(state.cookie_config.name.clone()).path("/"));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Inactive account", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    AuthService::change_password(&state.db, user_id, dto).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie_attributes() {
        let config = CookieConfig {
            name: "educa_token".to_string(),
            secure: true,
        };
        let cookie = auth_cookie(&config, "abc".to_string());

        assert_eq!(cookie.name(), "educa_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
