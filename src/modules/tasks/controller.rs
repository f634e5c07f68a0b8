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
use crate::modules::submissions::model::SubmissionDetail;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{CreateTaskDto, PaginatedTasksResponse, Task, TaskFilterParams, UpdateTaskDto};
use super::service::TaskService;

/// Create a task in a class
///
/// Teachers may only create tasks in classes they teach.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskDto,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the class teacher", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTaskDto>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    check_any_role(&auth_user, TEACHING)?;

    let task = TaskService::create_task(&state.db, &auth_user.actor()?, dto).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// List the tasks visible to the caller, by due date
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Class ID"),
        ("upcoming" = Option<bool>, Query, description = "Only tasks not yet due"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of tasks", body = PaginatedTasksResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<TaskFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedTasksResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let tasks = TaskService::get_tasks(&state.db, &auth_user.actor()?, filters).await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task details", body = Task),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Task not found or not visible", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let task = TaskService::get_task(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(task))
}

/// Update a task
///
/// Lowering `max_score` below a score already awarded is rejected.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskDto,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "max_score below an awarded score", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the class teacher", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTaskDto>,
) -> Result<Json<Task>, AppError> {
    check_any_role(&auth_user, TEACHING)?;

    let task = TaskService::update_task(&state.db, &auth_user.actor()?, id, dto).await?;
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the class teacher", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_any_role(&auth_user, TEACHING)?;

    TaskService::delete_task(&state.db, &auth_user.actor()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List every submission made for a task
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/submissions",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Submissions for the task", body = Vec<SubmissionDetail>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the class teacher", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_task_submissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionDetail>>, AppError> {
    let submissions = TaskService::get_task_submissions(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(submissions))
}
