//! Class (Turma) models and DTOs.
//!
//! A class is a cohort of students taught by at most one teacher during a
//! school year. Students join classes through enrollments.

use chrono::{DateTime, Utc};
use educa_core::serde::{deserialize_optional_i32, deserialize_optional_uuid};
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub year: i32,
    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CLASS_COLUMNS: &str = "id, name, description, year, teacher_id, created_at, updated_at";

/// A class together with its teacher's name and active enrollment count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassWithStats {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub year: i32,
    pub teacher_id: Option<Uuid>,
    pub teacher_name: Option<String>,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 120, message = "name must be between 1 and 120 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 120, message = "name must be between 1 and 120 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: Option<i32>,
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassFilterParams {
    /// Case-insensitive partial match on the class name
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub data: Vec<ClassWithStats>,
    pub meta: PaginationMeta,
}

/// A student on a class roster.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterEntry {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
}
