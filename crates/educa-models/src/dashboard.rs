//! Dashboard payloads.
//!
//! Each dashboard is a read-only aggregation over the academic tables,
//! tailored to one role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::achievements::Achievement;
use crate::roles::Role;

/// Headline figures for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentSummary {
    pub student_id: Uuid,
    pub student_name: String,
    pub enrolled_classes: i64,
    /// Tasks still open (due in the future) without a submission
    pub pending_tasks: i64,
    /// Tasks whose due date passed without a submission
    pub missed_tasks: i64,
    pub submitted_tasks: i64,
    pub graded_tasks: i64,
    /// Mean of `score / max_score` over graded submissions, in percent
    pub average_score_percent: Option<f64>,
    pub achievement_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UpcomingTask {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub max_score: f64,
    pub submitted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDashboard {
    pub summary: StudentSummary,
    pub upcoming_tasks: Vec<UpcomingTask>,
    pub recent_achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PendingSubmission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub task_title: String,
    pub class_name: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub submitted_at: DateTime<Utc>,
    pub late: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherDashboard {
    pub classes: i64,
    pub students: i64,
    pub tasks: i64,
    pub pending_grading: i64,
    pub recent_submissions: Vec<PendingSubmission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagerDashboard {
    pub users_by_role: Vec<RoleCount>,
    pub total_users: i64,
    pub classes: i64,
    pub active_enrollments: i64,
    pub tasks: i64,
    pub submissions: i64,
    pub graded_submissions: i64,
    /// `graded_submissions / submissions`, 0 when there are no submissions
    pub graded_ratio: f64,
}

impl ManagerDashboard {
    /// Assembles the dashboard, filling roles with no users with a zero count.
    #[must_use]
    pub fn new(
        counts: Vec<RoleCount>,
        classes: i64,
        active_enrollments: i64,
        tasks: i64,
        submissions: i64,
        graded_submissions: i64,
    ) -> Self {
        let users_by_role: Vec<RoleCount> = Role::ALL
            .into_iter()
            .map(|role| RoleCount {
                role,
                count: counts
                    .iter()
                    .find(|c| c.role == role)
                    .map_or(0, |c| c.count),
            })
            .collect();
        let total_users = users_by_role.iter().map(|c| c.count).sum();

        Self {
            users_by_role,
            total_users,
            classes,
            active_enrollments,
            tasks,
            submissions,
            graded_submissions,
            graded_ratio: ratio(graded_submissions, submissions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuardianDashboard {
    pub students: Vec<StudentSummary>,
}

fn ratio(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
