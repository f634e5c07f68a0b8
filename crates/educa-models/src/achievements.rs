//! Achievements awarded to students.

use chrono::{DateTime, Utc};
use educa_core::serde::deserialize_optional_uuid;
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Achievement {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub points: i32,
    pub awarded_by: Option<Uuid>,
    pub awarded_at: DateTime<Utc>,
}

pub const ACHIEVEMENT_COLUMNS: &str =
    "id, student_id, title, description, points, awarded_by, awarded_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAchievementDto {
    pub student_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "title must be between 1 and 120 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 1000, message = "points must be between 0 and 1000"))]
    pub points: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AchievementFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedAchievementsResponse {
    pub data: Vec<Achievement>,
    pub meta: PaginationMeta,
}
