use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};
use educa_models::Role;

use crate::metrics;
use crate::middleware::auth::Actor;
use crate::modules::tasks::service::fetch_task;
use crate::utils::access::{
    ensure_can_manage_class, fetch_class, is_enrolled, push_class_visibility,
    push_student_visibility,
};

use super::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, SUBMISSION_COLUMNS,
    Submission, SubmissionDetail, SubmissionFilterParams, UpdateSubmissionDto,
};

/// Select list for [`SubmissionDetail`]; callers append the `WHERE` condition.
pub const SUBMISSION_DETAIL_SELECT: &str = "SELECT s.id, s.task_id, t.title AS task_title, t.class_id,
        t.max_score, s.student_id, u.name AS student_name, s.content, s.attachment_url,
        s.submitted_at, s.late, s.score, s.feedback, s.graded_at
     FROM submissions s
     JOIN tasks t ON t.id = s.task_id
     JOIN users u ON u.id = s.student_id
     WHERE";

/// Students see their own submissions, guardians those of their students,
/// teachers those made in their classes and staff all of them.
fn push_submission_visibility(qb: &mut QueryBuilder<'_, Postgres>, actor: &Actor) {
    match actor.role {
        Role::Teacher => push_class_visibility(qb, actor, "t.class_id"),
        _ => push_student_visibility(qb, actor, "s.student_id"),
    }
}

fn push_submission_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &SubmissionFilterParams) {
    if let Some(task_id) = filters.task_id {
        qb.push(" AND s.task_id = ").push_bind(task_id);
    }
    if let Some(student_id) = filters.student_id {
        qb.push(" AND s.student_id = ").push_bind(student_id);
    }
    match filters.graded {
        Some(true) => {
            qb.push(" AND s.graded_at IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND s.graded_at IS NULL");
        }
        None => {}
    }
}

fn validate_score(score: f64, max_score: f64) -> Result<(), AppError> {
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "score must be between 0 and {max_score}"
        )));
    }
    Ok(())
}

async fn fetch_submission(db: &PgPool, submission_id: Uuid) -> Result<Submission, AppError> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Submission not found")))
}

pub struct SubmissionService;

impl SubmissionService {
    /// Records a student's submission for a task.
    ///
    /// Submissions after the due date are accepted and flagged as late.
    #[instrument(skip(db, dto), fields(user.id = %actor.id, task.id = %dto.task_id, db.operation = "INSERT", db.table = "submissions"))]
    pub async fn create_submission(
        db: &PgPool,
        actor: &Actor,
        dto: CreateSubmissionDto,
    ) -> Result<Submission, AppError> {
        let task = fetch_task(db, dto.task_id).await?;

        if !is_enrolled(db, actor.id, task.class_id).await? {
            warn!(class.id = %task.class_id, "Submission from a student not enrolled in the class");
            return Err(AppError::forbidden(
                "You are not enrolled in the class of this task",
            ));
        }

        let late = task.is_overdue_at(Utc::now());

        let submission = sqlx::query_as::<_, Submission>(&format!(
            "INSERT INTO submissions (task_id, student_id, content, attachment_url, late)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(task.id)
        .bind(actor.id)
        .bind(&dto.content)
        .bind(&dto.attachment_url)
        .bind(late)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "You have already submitted this task"
                ));
            }
            AppError::from(e)
        })?;

        metrics::record_submission_created(late);
        info!(submission.id = %submission.id, late, "Submission created");

        Ok(submission)
    }

    #[instrument(skip(db, filters), fields(user.id = %actor.id, user.role = %actor.role, db.operation = "SELECT", db.table = "submissions"))]
    pub async fn get_submissions(
        db: &PgPool,
        actor: &Actor,
        filters: SubmissionFilterParams,
    ) -> Result<PaginatedSubmissionsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM submissions s JOIN tasks t ON t.id = s.task_id WHERE ",
        );
        push_submission_visibility(&mut count_qb, actor);
        push_submission_filters(&mut count_qb, &filters);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb = QueryBuilder::<Postgres>::new(SUBMISSION_DETAIL_SELECT);
        data_qb.push(" ");
        push_submission_visibility(&mut data_qb, actor);
        push_submission_filters(&mut data_qb, &filters);
        data_qb
            .push(" ORDER BY s.submitted_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let submissions = data_qb
            .build_query_as::<SubmissionDetail>()
            .fetch_all(db)
            .await?;

        debug!(total, returned = submissions.len(), "Submissions fetched");

        Ok(PaginatedSubmissionsResponse {
            data: submissions,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "submissions"))]
    pub async fn get_submission(
        db: &PgPool,
        actor: &Actor,
        submission_id: Uuid,
    ) -> Result<SubmissionDetail, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(SUBMISSION_DETAIL_SELECT);
        qb.push(" s.id = ").push_bind(submission_id).push(" AND ");
        push_submission_visibility(&mut qb, actor);

        qb.build_query_as::<SubmissionDetail>()
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Submission not found")))
    }

    /// Lets the owning student edit a submission until it is graded.
    #[instrument(skip(db, dto), fields(user.id = %actor.id, db.operation = "UPDATE", db.table = "submissions"))]
    pub async fn update_submission(
        db: &PgPool,
        actor: &Actor,
        submission_id: Uuid,
        dto: UpdateSubmissionDto,
    ) -> Result<Submission, AppError> {
        let submission = fetch_submission(db, submission_id).await?;

        if submission.student_id != actor.id {
            return Err(AppError::forbidden("You can only edit your own submissions"));
        }
        if submission.is_graded() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Submission has already been graded"
            )));
        }

        // The graded_at guard closes the race with a concurrent grade.
        let updated = sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions SET
                content = COALESCE($1, content),
                attachment_url = COALESCE($2, attachment_url)
             WHERE id = $3 AND graded_at IS NULL
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(&dto.content)
        .bind(&dto.attachment_url)
        .bind(submission_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("Submission has already been graded"))
        })?;

        info!(submission.id = %updated.id, "Submission updated");

        Ok(updated)
    }

    #[instrument(skip(db, dto), fields(user.id = %actor.id, score = dto.score, db.operation = "UPDATE", db.table = "submissions"))]
    pub async fn grade_submission(
        db: &PgPool,
        actor: &Actor,
        submission_id: Uuid,
        dto: GradeSubmissionDto,
    ) -> Result<Submission, AppError> {
        let submission = fetch_submission(db, submission_id).await?;
        let task = fetch_task(db, submission.task_id).await?;
        let class = fetch_class(db, task.class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        validate_score(dto.score, task.max_score)?;

        let graded = sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions SET
                score = $1,
                feedback = $2,
                graded_at = NOW(),
                graded_by = $3
             WHERE id = $4
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(dto.score)
        .bind(&dto.feedback)
        .bind(actor.id)
        .bind(submission_id)
        .fetch_one(db)
        .await?;

        metrics::record_submission_graded(dto.score, task.max_score);
        info!(submission.id = %graded.id, "Submission graded");

        Ok(graded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use educa_core::PaginationParams;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(0.0, 10.0).is_ok());
        assert!(validate_score(10.0, 10.0).is_ok());
        assert!(validate_score(7.5, 10.0).is_ok());

        assert!(validate_score(-0.1, 10.0).is_err());
        assert!(validate_score(10.5, 10.0).is_err());
        assert!(validate_score(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_submission_visibility_by_role() {
        let mut qb = QueryBuilder::<Postgres>::new("WHERE ");
        push_submission_visibility(&mut qb, &actor(Role::Student));
        assert_eq!(qb.sql(), "WHERE s.student_id = $1");

        let mut qb = QueryBuilder::<Postgres>::new("WHERE ");
        push_submission_visibility(&mut qb, &actor(Role::Teacher));
        assert!(qb.sql().contains("vc.id = t.class_id AND vc.teacher_id = $1"));

        let mut qb = QueryBuilder::<Postgres>::new("WHERE ");
        push_submission_visibility(&mut qb, &actor(Role::Administrator));
        assert_eq!(qb.sql(), "WHERE TRUE");
    }

    #[test]
    fn test_submission_filters_sql() {
        let filters = SubmissionFilterParams {
            task_id: Some(Uuid::new_v4()),
            student_id: None,
            graded: Some(false),
            pagination: PaginationParams::default(),
        };
        let mut qb = QueryBuilder::<Postgres>::new("WHERE TRUE");
        push_submission_filters(&mut qb, &filters);

        assert_eq!(
            qb.sql(),
            "WHERE TRUE AND s.task_id = $1 AND s.graded_at IS NULL"
        );
    }
}
