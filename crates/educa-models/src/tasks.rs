//! Task (Tarefa) models and DTOs.

use chrono::{DateTime, Utc};
use educa_core::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Maximum score used when a task is created without one.
pub const DEFAULT_MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub class_id: Uuid,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub max_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TASK_COLUMNS: &str =
    "id, class_id, created_by, title, description, due_date, max_score, created_at, updated_at";

impl Task {
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        now > self.due_date
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTaskDto {
    pub class_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[validate(range(
        exclusive_min = 0.0,
        max = 1000.0,
        message = "max_score must be greater than 0 and at most 1000"
    ))]
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(
        exclusive_min = 0.0,
        max = 1000.0,
        message = "max_score must be greater than 0 and at most 1000"
    ))]
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaskFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    /// Only tasks whose due date is still ahead
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub upcoming: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedTasksResponse {
    pub data: Vec<Task>,
    pub meta: PaginationMeta,
}
