use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use educa_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateMessageDto, CreateTopicDto, Message, PaginatedTopicsResponse, Topic, TopicFilterParams,
    TopicThread,
};
use super::service::ForumService;

/// List forum topics, newest first
///
/// Only topics of classes visible to the caller are returned.
#[utoipa::path(
    get,
    path = "/api/forum/topics",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Class ID"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, overrides offset")
    ),
    responses(
        (status = 200, description = "Paginated list of topics", body = PaginatedTopicsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_topics(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<TopicFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedTopicsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let topics = ForumService::get_topics(&state.db, &auth_user.actor()?, filters).await?;
    Ok(Json(topics))
}

/// Open a topic in a class forum
#[utoipa::path(
    post,
    path = "/api/forum/topics",
    request_body = CreateTopicDto,
    responses(
        (status = 201, description = "Topic created", body = Topic),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not a member of the class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTopicDto>,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    let topic = ForumService::create_topic(&state.db, &auth_user.actor()?, dto).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

#[utoipa::path(
    get,
    path = "/api/forum/topics/{id}",
    params(("id" = Uuid, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic with its messages", body = TopicThread),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TopicThread>, AppError> {
    let thread = ForumService::get_topic(&state.db, &auth_user.actor()?, id).await?;
    Ok(Json(thread))
}

#[utoipa::path(
    delete,
    path = "/api/forum/topics/{id}",
    params(("id" = Uuid, Path, description = "Topic ID")),
    responses(
        (status = 204, description = "Topic deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author, class teacher or staff", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ForumService::delete_topic(&state.db, &auth_user.actor()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Post a message to a topic
///
/// `parent_id`, when given, must reference a message of the same topic.
#[utoipa::path(
    post,
    path = "/api/forum/topics/{id}/messages",
    params(("id" = Uuid, Path, description = "Topic ID")),
    request_body = CreateMessageDto,
    responses(
        (status = 201, description = "Message posted", body = Message),
        (status = 400, description = "parent_id belongs to another topic", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not a member of the class", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn post_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateMessageDto>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = ForumService::post_message(&state.db, &auth_user.actor()?, id, dto).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    delete,
    path = "/api/forum/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author, class teacher or staff", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    tag = "Forum",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ForumService::delete_message(&state.db, &auth_user.actor()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
