//! Submission (Submissão) models and DTOs.
//!
//! A submission is a student's work for a task. Each student submits at most
//! once per task; the submission can be edited until a teacher grades it.

use chrono::{DateTime, Utc};
use educa_core::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    pub attachment_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Submitted after the task's due date
    pub late: bool,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<Uuid>,
}

pub const SUBMISSION_COLUMNS: &str = "id, task_id, student_id, content, attachment_url, submitted_at, late, score, feedback, graded_at, graded_by";

impl Submission {
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.graded_at.is_some()
    }
}

/// Submission joined with task and student information.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubmissionDetail {
    pub id: Uuid,
    pub task_id: Uuid,
    pub task_title: String,
    pub class_id: Uuid,
    pub max_score: f64,
    pub student_id: Uuid,
    pub student_name: String,
    pub content: String,
    pub attachment_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub late: bool,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubmissionDto {
    pub task_id: Uuid,
    #[validate(length(min = 1, max = 20000, message = "content must be between 1 and 20000 characters"))]
    pub content: String,
    #[validate(url(message = "attachment_url must be a valid URL"))]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubmissionDto {
    #[validate(length(min = 1, max = 20000, message = "content must be between 1 and 20000 characters"))]
    pub content: Option<String>,
    #[validate(url(message = "attachment_url must be a valid URL"))]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GradeSubmissionDto {
    #[validate(range(min = 0.0, message = "score must not be negative"))]
    pub score: f64,
    #[validate(length(max = 5000, message = "feedback must be at most 5000 characters"))]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmissionFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub task_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub graded: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedSubmissionsResponse {
    pub data: Vec<SubmissionDetail>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_rejects_negative_score() {
        let dto = GradeSubmissionDto {
            score: -0.5,
            feedback: None,
        };
        assert!(dto.validate().is_err());

        let dto = GradeSubmissionDto {
            score: 0.0,
            feedback: Some("Revise a introdução".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_attachment_must_be_url() {
        let dto = CreateSubmissionDto {
            task_id: Uuid::new_v4(),
            content: "Resposta".to_string(),
            attachment_url: Some("not a url".to_string()),
        };
        assert!(dto.validate().is_err());

        let dto = CreateSubmissionDto {
            task_id: Uuid::new_v4(),
            content: "Resposta".to_string(),
            attachment_url: Some("https://files.escola.br/a.pdf".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_is_graded() {
        let mut submission = Submission {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            content: "Resposta".to_string(),
            attachment_url: None,
            submitted_at: Utc::now(),
            late: false,
            score: None,
            feedback: None,
            graded_at: None,
            graded_by: None,
        };
        assert!(!submission.is_graded());
        submission.graded_at = Some(Utc::now());
        assert!(submission.is_graded());
    }
}
