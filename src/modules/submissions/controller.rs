use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::Role;
use educa_models::roles::TEACHING;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{check_any_role, check_role};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, Submission,
    SubmissionDetail, SubmissionFilterParams, UpdateSubmissionDto,
};
use super::service::SubmissionService;

/// Submit work for a task (students only)
///
/// Submissions after the due date are accepted with `late = true`.
#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = CreateSubmissionDto,
    responses(
        (status = 201, description = "Submission created", body = Submission),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not a student, or not enrolled in the class", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already submitted", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateSubmissionDto>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    check_role(&auth_user, Role::Student)?;

    let submission =
        SubmissionService::create_submission(&state.db, &auth_user.actor()?, dto).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// List the submissions visible to the caller
#[utoipa::path(
    get,
    path = "/api/submissions",
    params(
        ("task_id" = Option<Uuid>, Query, description = "Task ID"),
        ("student_id" = Option<Uuid>, Query, description = "Student ID"),
        ("graded" = Option<bool>, Query, description = "Only graded (true) or ungraded (false)"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of submissions", body = PaginatedSubmissionsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_submissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<SubmissionFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedSubmissionsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let submissions =
        SubmissionService::get_submissions(&state.db, &auth_user.actor()?, filters).await?;
    Ok(Json(submissions))
}

#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission details", body = SubmissionDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Submission not found or not visible", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionDetail>, AppError> {
    let submission = SubmissionService::get_submission(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(submission))
}

/// Edit an ungraded submission (owning student only)
#[utoipa::path(
    patch,
    path = "/api/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = UpdateSubmissionDto,
    responses(
        (status = 200, description = "Submission updated", body = Submission),
        (status = 400, description = "Submission has already been graded", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSubmissionDto>,
) -> Result<Json<Submission>, AppError> {
    check_role(&auth_user, Role::Student)?;

    let submission =
        SubmissionService::update_submission(&state.db, &auth_user.actor()?, id, dto).await?;
    Ok(Json(submission))
}

/// Grade a submission
#[utoipa::path(
    put,
    path = "/api/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = GradeSubmissionDto,
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 400, description = "Score outside 0..=max_score", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the class teacher", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn grade_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<GradeSubmissionDto>,
) -> Result<Json<Submission>, AppError> {
    check_any_role(&auth_user, TEACHING)?;

    let submission =
        SubmissionService::grade_submission(&state.db, &auth_user.actor()?, id, dto).await?;
    Ok(Json(submission))
}
