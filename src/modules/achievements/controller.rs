use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::roles::TEACHING;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Achievement, AchievementFilterParams, CreateAchievementDto, PaginatedAchievementsResponse,
};
use super::service::AchievementService;

/// Award an achievement to a student
#[utoipa::path(
    post,
    path = "/api/achievements",
    request_body = CreateAchievementDto,
    responses(
        (status = 201, description = "Achievement awarded", body = Achievement),
        (status = 400, description = "Recipient is not a student", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teaching roles only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Achievements",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_achievement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateAchievementDto>,
) -> Result<(StatusCode, Json<Achievement>), AppError> {
    check_any_role(&auth_user, TEACHING)?;

    let achievement =
        AchievementService::create_achievement(&state.db, &auth_user.actor()?, dto).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

#[utoipa::path(
    get,
    path = "/api/achievements",
    params(
        ("student_id" = Option<Uuid>, Query, description = "Student ID"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of achievements", body = PaginatedAchievementsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Achievements",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_achievements(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<AchievementFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedAchievementsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let achievements =
        AchievementService::get_achievements(&state.db, &auth_user.actor()?, filters).await?;
    Ok(Json(achievements))
}

/// Revoke an achievement (awarding teacher or staff)
#[utoipa::path(
    delete,
    path = "/api/achievements/{id}",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    responses(
        (status = 204, description = "Achievement revoked"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the awarder or staff", body = ErrorResponse),
        (status = 404, description = "Achievement not found", body = ErrorResponse)
    ),
    tag = "Achievements",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_achievement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_any_role(&auth_user, TEACHING)?;

    AchievementService::delete_achievement(&state.db, &auth_user.actor()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
