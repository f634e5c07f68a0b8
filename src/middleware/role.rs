//! Role-based authorization.
//!
//! Routes are guarded with a middleware layer that only lets through callers
//! whose role is in an allow-list:
//!
//! ```rust,ignore
//! use axum::{Router, middleware};
//! use crate::middleware::role::require_staff;
//!
//! let routes = Router::new()
//!     .route("/", post(create_class))
//!     .layer(middleware::from_fn_with_state(state.clone(), require_staff));
//! ```
//!
//! Handlers that need finer decisions use [`check_role`] and [`check_any_role`].

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use educa_core::AppError;
use educa_models::Role;
use educa_models::roles::{ADMIN_ONLY, STAFF, TEACHING};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Rejects the request unless the authenticated caller has one of `allowed_roles`.
///
/// An empty allow-list rejects everyone. On success the verified [`AuthUser`]
/// is stored in the request extensions so handlers do not verify the token twice.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &'static [Role],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    ensure_allowed(auth_user.role()?, allowed_roles)?;

    parts.extensions.insert(auth_user);
    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(State(state), req, next, ADMIN_ONLY)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Administrators and managers.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(State(state), req, next, STAFF)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Staff and teachers.
pub async fn require_teaching(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_roles(State(state), req, next, TEACHING)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

pub fn check_role(auth_user: &AuthUser, required_role: Role) -> Result<(), AppError> {
    ensure_allowed(auth_user.role()?, &[required_role])
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<(), AppError> {
    ensure_allowed(auth_user.role()?, allowed_roles)
}

fn ensure_allowed(role: Role, allowed_roles: &[Role]) -> Result<(), AppError> {
    if allowed_roles.contains(&role) {
        return Ok(());
    }

    let required = allowed_roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Err(AppError::forbidden(format!(
        "Access denied. Required roles: [{required}], but user has role: {role}"
    )))
}
