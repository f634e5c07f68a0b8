//! Read-only aggregations behind the role dashboards.
//!
//! Every figure is a single SQL aggregate; nothing is computed by loading
//! rows into memory.

use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::Role;
use educa_models::achievements::{ACHIEVEMENT_COLUMNS, Achievement};

use crate::middleware::auth::Actor;
use crate::utils::access::is_guardian_of;

use super::model::{
    GuardianDashboard, ManagerDashboard, PendingSubmission, RoleCount, StudentDashboard,
    StudentSummary, TeacherDashboard, UpcomingTask,
};

const DASHBOARD_LIST_LIMIT: i64 = 5;

/// Per-student headline figures; callers append the `WHERE` condition on `u`.
const STUDENT_SUMMARY_SELECT: &str = "SELECT u.id AS student_id, u.name AS student_name,
        (SELECT COUNT(*) FROM enrollments e
         WHERE e.student_id = u.id AND e.status = 'ATIVA') AS enrolled_classes,
        (SELECT COUNT(*) FROM tasks t
         JOIN enrollments e ON e.class_id = t.class_id AND e.student_id = u.id AND e.status = 'ATIVA'
         WHERE t.due_date > NOW()
           AND NOT EXISTS (SELECT 1 FROM submissions s WHERE s.task_id = t.id AND s.student_id = u.id)
        ) AS pending_tasks,
        (SELECT COUNT(*) FROM tasks t
         JOIN enrollments e ON e.class_id = t.class_id AND e.student_id = u.id AND e.status = 'ATIVA'
         WHERE t.due_date <= NOW()
           AND NOT EXISTS (SELECT 1 FROM submissions s WHERE s.task_id = t.id AND s.student_id = u.id)
        ) AS missed_tasks,
        (SELECT COUNT(*) FROM submissions s WHERE s.student_id = u.id) AS submitted_tasks,
        (SELECT COUNT(*) FROM submissions s
         WHERE s.student_id = u.id AND s.graded_at IS NOT NULL) AS graded_tasks,
        (SELECT AVG(s.score / t.max_score * 100.0)::FLOAT8 FROM submissions s
         JOIN tasks t ON t.id = s.task_id
         WHERE s.student_id = u.id AND s.score IS NOT NULL AND t.max_score > 0
        ) AS average_score_percent,
        (SELECT COALESCE(SUM(a.points), 0)::BIGINT FROM achievements a
         WHERE a.student_id = u.id) AS achievement_points
     FROM users u
     WHERE u.role = 'ALUNO' AND ";

/// Guardians may open the dashboard of a linked student; staff of any student.
fn ensure_student_dashboard_access(actor: &Actor, linked: bool) -> Result<(), AppError> {
    if actor.is_staff() || (actor.role == Role::Guardian && linked) {
        Ok(())
    } else {
        Err(AppError::forbidden("You are not linked to this student"))
    }
}

async fn student_summary(db: &PgPool, student_id: Uuid) -> Result<StudentSummary, AppError> {
    sqlx::query_as::<_, StudentSummary>(&format!("{STUDENT_SUMMARY_SELECT}u.id = $1"))
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
}

async fn count(db: &PgPool, sql: &str, bind: Option<Uuid>) -> Result<i64, AppError> {
    let query = sqlx::query_scalar::<_, i64>(sql);
    let query = match bind {
        Some(id) => query.bind(id),
        None => query,
    };
    Ok(query.fetch_one(db).await?)
}

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn student_dashboard(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<StudentDashboard, AppError> {
        let summary = student_summary(db, student_id).await?;

        let upcoming_tasks = sqlx::query_as::<_, UpcomingTask>(
            "SELECT t.id, t.class_id, c.name AS class_name, t.title, t.due_date, t.max_score,
                    EXISTS (SELECT 1 FROM submissions s
                            WHERE s.task_id = t.id AND s.student_id = $1) AS submitted
             FROM tasks t
             JOIN classes c ON c.id = t.class_id
             JOIN enrollments e ON e.class_id = t.class_id AND e.student_id = $1 AND e.status = 'ATIVA'
             WHERE t.due_date > NOW()
             ORDER BY t.due_date ASC
             LIMIT $2",
        )
        .bind(student_id)
        .bind(DASHBOARD_LIST_LIMIT)
        .fetch_all(db)
        .await?;

        let recent_achievements = sqlx::query_as::<_, Achievement>(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements
             WHERE student_id = $1
             ORDER BY awarded_at DESC
             LIMIT $2"
        ))
        .bind(student_id)
        .bind(DASHBOARD_LIST_LIMIT)
        .fetch_all(db)
        .await?;

        debug!(
            upcoming = upcoming_tasks.len(),
            achievements = recent_achievements.len(),
            "Student dashboard loaded"
        );

        Ok(StudentDashboard {
            summary,
            upcoming_tasks,
            recent_achievements,
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn teacher_dashboard(
        db: &PgPool,
        teacher_id: Uuid,
    ) -> Result<TeacherDashboard, AppError> {
        let classes = count(
            db,
            "SELECT COUNT(*) FROM classes WHERE teacher_id = $1",
            Some(teacher_id),
        )
        .await?;
        let students = count(
            db,
            "SELECT COUNT(DISTINCT e.student_id) FROM enrollments e
             JOIN classes c ON c.id = e.class_id
             WHERE c.teacher_id = $1 AND e.status = 'ATIVA'",
            Some(teacher_id),
        )
        .await?;
        let tasks = count(
            db,
            "SELECT COUNT(*) FROM tasks t
             JOIN classes c ON c.id = t.class_id
             WHERE c.teacher_id = $1",
            Some(teacher_id),
        )
        .await?;
        let pending_grading = count(
            db,
            "SELECT COUNT(*) FROM submissions s
             JOIN tasks t ON t.id = s.task_id
             JOIN classes c ON c.id = t.class_id
             WHERE c.teacher_id = $1 AND s.graded_at IS NULL",
            Some(teacher_id),
        )
        .await?;

        let recent_submissions = sqlx::query_as::<_, PendingSubmission>(
            "SELECT s.id, s.task_id, t.title AS task_title, c.name AS class_name,
                    s.student_id, u.name AS student_name, s.submitted_at, s.late
             FROM submissions s
             JOIN tasks t ON t.id = s.task_id
             JOIN classes c ON c.id = t.class_id
             JOIN users u ON u.id = s.student_id
             WHERE c.teacher_id = $1 AND s.graded_at IS NULL
             ORDER BY s.submitted_at DESC
             LIMIT $2",
        )
        .bind(teacher_id)
        .bind(DASHBOARD_LIST_LIMIT)
        .fetch_all(db)
        .await?;

        Ok(TeacherDashboard {
            classes,
            students,
            tasks,
            pending_grading,
            recent_submissions,
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn manager_dashboard(db: &PgPool) -> Result<ManagerDashboard, AppError> {
        let role_counts = sqlx::query_as::<_, RoleCount>(
            "SELECT role, COUNT(*) AS count FROM users GROUP BY role",
        )
        .fetch_all(db)
        .await?;

        let classes = count(db, "SELECT COUNT(*) FROM classes", None).await?;
        let active_enrollments = count(
            db,
            "SELECT COUNT(*) FROM enrollments WHERE status = 'ATIVA'",
            None,
        )
        .await?;
        let tasks = count(db, "SELECT COUNT(*) FROM tasks", None).await?;
        let submissions = count(db, "SELECT COUNT(*) FROM submissions", None).await?;
        let graded_submissions = count(
            db,
            "SELECT COUNT(*) FROM submissions WHERE graded_at IS NOT NULL",
            None,
        )
        .await?;

        Ok(ManagerDashboard::new(
            role_counts,
            classes,
            active_enrollments,
            tasks,
            submissions,
            graded_submissions,
        ))
    }

    /// Summary figures for every student linked to the guardian.
    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn guardian_dashboard(
        db: &PgPool,
        guardian_id: Uuid,
    ) -> Result<GuardianDashboard, AppError> {
        let students = sqlx::query_as::<_, StudentSummary>(&format!(
            "{STUDENT_SUMMARY_SELECT}u.id IN
                (SELECT student_id FROM guardian_students WHERE guardian_id = $1)
             ORDER BY u.name ASC"
        ))
        .bind(guardian_id)
        .fetch_all(db)
        .await?;

        debug!(students = students.len(), "Guardian dashboard loaded");

        Ok(GuardianDashboard { students })
    }

    /// Full student dashboard as seen by a guardian or a staff member.
    #[instrument(skip(db), fields(user.id = %actor.id, student.id = %student_id))]
    pub async fn guardian_student_dashboard(
        db: &PgPool,
        actor: &Actor,
        student_id: Uuid,
    ) -> Result<StudentDashboard, AppError> {
        let linked = actor.role == Role::Guardian && is_guardian_of(db, actor.id, student_id).await?;
        if let Err(err) = ensure_student_dashboard_access(actor, linked) {
            warn!("Dashboard requested for an unlinked student");
            return Err(err);
        }

        Self::student_dashboard(db, student_id).await
    }
}
