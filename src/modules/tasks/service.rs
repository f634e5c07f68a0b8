use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};

use crate::middleware::auth::Actor;
use crate::modules::submissions::model::SubmissionDetail;
use crate::modules::submissions::service::SUBMISSION_DETAIL_SELECT;
use crate::utils::access::{
    can_view_class, ensure_can_manage_class, fetch_class, push_class_visibility,
};

use super::model::{
    CreateTaskDto, DEFAULT_MAX_SCORE, PaginatedTasksResponse, TASK_COLUMNS, Task,
    TaskFilterParams, UpdateTaskDto,
};

fn push_task_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &TaskFilterParams) {
    if let Some(class_id) = filters.class_id {
        qb.push(" AND class_id = ").push_bind(class_id);
    }
    if filters.upcoming == Some(true) {
        qb.push(" AND due_date > NOW()");
    }
}

/// Rejects a new maximum score lower than a score already awarded for the task.
fn check_max_score_change(new_max: f64, highest_awarded: Option<f64>) -> Result<(), AppError> {
    match highest_awarded {
        Some(highest) if new_max < highest => Err(AppError::bad_request(anyhow::anyhow!(
            "max_score cannot be lower than an already awarded score ({highest})"
        ))),
        _ => Ok(()),
    }
}

pub async fn fetch_task(db: &PgPool, task_id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
        .bind(task_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Task not found")))
}

pub struct TaskService;

impl TaskService {
    #[instrument(skip(db, dto), fields(user.id = %actor.id, class.id = %dto.class_id, db.operation = "INSERT", db.table = "tasks"))]
    pub async fn create_task(
        db: &PgPool,
        actor: &Actor,
        dto: CreateTaskDto,
    ) -> Result<Task, AppError> {
        let class = fetch_class(db, dto.class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (class_id, created_by, title, description, due_date, max_score)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(dto.class_id)
        .bind(actor.id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.due_date)
        .bind(dto.max_score.unwrap_or(DEFAULT_MAX_SCORE))
        .fetch_one(db)
        .await?;

        info!(task.id = %task.id, "Task created");

        Ok(task)
    }

    #[instrument(skip(db, filters), fields(user.id = %actor.id, user.role = %actor.role, db.operation = "SELECT", db.table = "tasks"))]
    pub async fn get_tasks(
        db: &PgPool,
        actor: &Actor,
        filters: TaskFilterParams,
    ) -> Result<PaginatedTasksResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks WHERE ");
        push_class_visibility(&mut count_qb, actor, "tasks.class_id");
        push_task_filters(&mut count_qb, &filters);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE "));
        push_class_visibility(&mut data_qb, actor, "tasks.class_id");
        push_task_filters(&mut data_qb, &filters);
        data_qb
            .push(" ORDER BY due_date ASC, created_at ASC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let tasks = data_qb.build_query_as::<Task>().fetch_all(db).await?;

        debug!(total, returned = tasks.len(), "Tasks fetched");

        Ok(PaginatedTasksResponse {
            data: tasks,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "tasks"))]
    pub async fn get_task(db: &PgPool, actor: &Actor, task_id: Uuid) -> Result<Task, AppError> {
        let task = fetch_task(db, task_id).await?;

        if !can_view_class(db, actor, task.class_id).await? {
            return Err(AppError::not_found(anyhow::anyhow!("Task not found")));
        }

        Ok(task)
    }

    #[instrument(skip(db, dto), fields(user.id = %actor.id, db.operation = "UPDATE", db.table = "tasks"))]
    pub async fn update_task(
        db: &PgPool,
        actor: &Actor,
        task_id: Uuid,
        dto: UpdateTaskDto,
    ) -> Result<Task, AppError> {
        let task = fetch_task(db, task_id).await?;
        let class = fetch_class(db, task.class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        if let Some(new_max) = dto.max_score
            && new_max < task.max_score
        {
            let highest = sqlx::query_scalar::<_, Option<f64>>(
                "SELECT MAX(score) FROM submissions WHERE task_id = $1",
            )
            .bind(task_id)
            .fetch_one(db)
            .await?;

            check_max_score_change(new_max, highest).inspect_err(|_| {
                warn!(task.id = %task_id, new_max, "Rejected max_score below awarded score");
            })?;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                due_date = COALESCE($3, due_date),
                max_score = COALESCE($4, max_score),
                updated_at = NOW()
             WHERE id = $5
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.due_date)
        .bind(dto.max_score)
        .bind(task_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Task not found")))?;

        info!(task.id = %task.id, "Task updated");

        Ok(task)
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "DELETE", db.table = "tasks"))]
    pub async fn delete_task(db: &PgPool, actor: &Actor, task_id: Uuid) -> Result<(), AppError> {
        let task = fetch_task(db, task_id).await?;
        let class = fetch_class(db, task.class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(db)
            .await?;

        info!(task.id = %task_id, "Task deleted");

        Ok(())
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "submissions"))]
    pub async fn get_task_submissions(
        db: &PgPool,
        actor: &Actor,
        task_id: Uuid,
    ) -> Result<Vec<SubmissionDetail>, AppError> {
        let task = fetch_task(db, task_id).await?;
        let class = fetch_class(db, task.class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        let submissions = sqlx::query_as::<_, SubmissionDetail>(&format!(
            "{SUBMISSION_DETAIL_SELECT} s.task_id = $1 ORDER BY s.submitted_at ASC"
        ))
        .bind(task_id)
        .fetch_all(db)
        .await?;

        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use educa_core::PaginationParams;

    #[test]
    fn test_max_score_change() {
        assert!(check_max_score_change(5.0, None).is_ok());
        assert!(check_max_score_change(8.0, Some(8.0)).is_ok());
        assert!(check_max_score_change(20.0, Some(9.5)).is_ok());

        let err = check_max_score_change(7.0, Some(9.5)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_task_filters_sql() {
        let filters = TaskFilterParams {
            class_id: Some(Uuid::new_v4()),
            upcoming: Some(true),
            pagination: PaginationParams::default(),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks WHERE TRUE");
        push_task_filters(&mut qb, &filters);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM tasks WHERE TRUE AND class_id = $1 AND due_date > NOW()"
        );
    }

    #[test]
    fn test_upcoming_false_adds_nothing() {
        let filters = TaskFilterParams {
            class_id: None,
            upcoming: Some(false),
            pagination: PaginationParams::default(),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks WHERE TRUE");
        push_task_filters(&mut qb, &filters);

        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tasks WHERE TRUE");
    }
}
