use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::Role;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_role;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateUserDto, LinkStudentDto, LinkedStudent, PaginatedUsersResponse, UpdateUserDto, User,
    UserFilterParams,
};
use super::service::UserService;

/// Create a user (administrators only)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Email already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - administrators only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    check_role(&auth_user, Role::Administrator)?;

    let user = UserService::create_user(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("role" = Option<Role>, Query, description = "Filter by role"),
        ("name" = Option<String>, Query, description = "Partial match on name or email"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedUsersResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    filters: Result<Query<UserFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Update a user (administrators only)
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Email already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - administrators only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    check_role(&auth_user, Role::Administrator)?;

    let user = UserService::update_user(&state.db, id, dto).await?;
    Ok(Json(user))
}

/// Delete a user (administrators only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - administrators only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_role(&auth_user, Role::Administrator)?;

    UserService::delete_user(&state.db, auth_user.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link a student to a guardian
#[utoipa::path(
    post,
    path = "/api/users/{id}/students",
    params(("id" = Uuid, Path, description = "Guardian user ID")),
    request_body = LinkStudentDto,
    responses(
        (status = 201, description = "Student linked (or already linked)", body = LinkedStudent),
        (status = 400, description = "Users do not have the guardian and student roles", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn link_student(
    State(state): State<AppState>,
    Path(guardian_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<LinkStudentDto>,
) -> Result<(StatusCode, Json<LinkedStudent>), AppError> {
    let linked = UserService::link_student(&state.db, guardian_id, dto.student_id).await?;
    Ok((StatusCode::CREATED, Json(linked)))
}

/// List the students linked to a guardian
#[utoipa::path(
    get,
    path = "/api/users/{id}/students",
    params(("id" = Uuid, Path, description = "Guardian user ID")),
    responses(
        (status = 200, description = "Linked students", body = Vec<LinkedStudent>),
        (status = 400, description = "User is not a guardian", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Guardian not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_linked_students(
    State(state): State<AppState>,
    Path(guardian_id): Path<Uuid>,
) -> Result<Json<Vec<LinkedStudent>>, AppError> {
    let students = UserService::get_linked_students(&state.db, guardian_id).await?;
    Ok(Json(students))
}

/// Remove a guardian-student link
#[utoipa::path(
    delete,
    path = "/api/users/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Guardian user ID"),
        ("student_id" = Uuid, Path, description = "Student user ID")
    ),
    responses(
        (status = 204, description = "Link removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn unlink_student(
    State(state): State<AppState>,
    Path((guardian_id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    UserService::unlink_student(&state.db, guardian_id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
