use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;

use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateEnrollmentDto, Enrollment, EnrollmentFilterParams, EnrollmentStatus,
    PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
use super::service::EnrollmentService;

/// Enroll a student in a class
///
/// Re-enrolling a student whose enrollment was cancelled reactivates it.
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Student enrolled", body = Enrollment),
        (status = 400, description = "User is not a student", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Student or class not found", body = ErrorResponse),
        (status = 409, description = "Student is already enrolled in this class", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_enrollment(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = EnrollmentService::create_enrollment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// List enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Class ID"),
        ("student_id" = Option<Uuid>, Query, description = "Student ID"),
        ("status" = Option<EnrollmentStatus>, Query, description = "ATIVA or CANCELADA"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of enrollments", body = PaginatedEnrollmentsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_enrollments(
    State(state): State<AppState>,
    filters: Result<Query<EnrollmentFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let enrollments = EnrollmentService::get_enrollments(&state.db, filters).await?;
    Ok(Json(enrollments))
}

/// Change an enrollment's status
#[utoipa::path(
    patch,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    request_body = UpdateEnrollmentDto,
    responses(
        (status = 200, description = "Enrollment updated", body = Enrollment),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_enrollment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateEnrollmentDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::update_enrollment(&state.db, id, dto).await?;
    Ok(Json(enrollment))
}

/// Delete an enrollment
#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    EnrollmentService::delete_enrollment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
