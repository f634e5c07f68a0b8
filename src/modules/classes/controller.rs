use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::roles::{STAFF, TEACHING};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Class, ClassFilterParams, ClassWithStats, CreateClassDto, PaginatedClassesResponse,
    RosterEntry, UpdateClassDto,
};
use super::service::ClassService;

/// Create a class (staff only)
#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "teacher_id does not reference a teacher", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    check_any_role(&auth_user, STAFF)?;

    let class = ClassService::create_class(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// List the classes visible to the caller
///
/// Staff see every class, teachers the classes they teach, students the
/// classes they are enrolled in and guardians their students' classes.
#[utoipa::path(
    get,
    path = "/api/classes",
    params(
        ("name" = Option<String>, Query, description = "Partial match on class name"),
        ("year" = Option<i32>, Query, description = "School year"),
        ("teacher_id" = Option<Uuid>, Query, description = "Teacher ID"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of classes", body = PaginatedClassesResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_classes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<ClassFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let classes = ClassService::get_classes(&state.db, &auth_user.actor()?, filters).await?;
    Ok(Json(classes))
}

/// Get a class by ID
#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = ClassWithStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found or not visible", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassWithStats>, AppError> {
    let class = ClassService::get_class(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(class))
}

/// Update a class (staff only)
#[utoipa::path(
    patch,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 400, description = "teacher_id does not reference a teacher", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    check_any_role(&auth_user, STAFF)?;

    let class = ClassService::update_class(&state.db, id, dto).await?;
    Ok(Json(class))
}

/// Delete a class (staff only)
#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_any_role(&auth_user, STAFF)?;

    ClassService::delete_class(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the students enrolled in a class
#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class roster", body = Vec<RosterEntry>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - class teacher or staff only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_class_students(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    check_any_role(&auth_user, TEACHING)?;

    let roster = ClassService::get_roster(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(roster))
}
