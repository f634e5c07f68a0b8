//! Enrollment (Matrícula) models and DTOs.

use chrono::{DateTime, Utc};
use educa_core::serde::deserialize_optional_uuid;
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "enrollment_status")]
pub enum EnrollmentStatus {
    #[serde(rename = "ATIVA")]
    #[sqlx(rename = "ATIVA")]
    Active,
    #[serde(rename = "CANCELADA")]
    #[sqlx(rename = "CANCELADA")]
    Cancelled,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ATIVA",
            EnrollmentStatus::Cancelled => "CANCELADA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ENROLLMENT_COLUMNS: &str = "id, student_id, class_id, status, created_at, updated_at";

/// Enrollment joined with student and class names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EnrollmentDetail {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEnrollmentDto {
    pub student_id: Uuid,
    pub class_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateEnrollmentDto {
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub status: Option<EnrollmentStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<EnrollmentDetail>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&EnrollmentStatus::Active).unwrap(),
            r#""ATIVA""#
        );
        let status: EnrollmentStatus = serde_json::from_str(r#""CANCELADA""#).unwrap();
        assert_eq!(status, EnrollmentStatus::Cancelled);
        assert_eq!(status.as_str(), "CANCELADA");
    }

    #[test]
    fn test_filter_status_from_query() {
        let filters: EnrollmentFilterParams =
            serde_json::from_str(r#"{"status":"ATIVA","class_id":""}"#).unwrap();
        assert_eq!(filters.status, Some(EnrollmentStatus::Active));
        assert!(filters.class_id.is_none());
    }
}
