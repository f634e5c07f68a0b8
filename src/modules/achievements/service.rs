use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};
use educa_models::Role;

use crate::metrics;
use crate::middleware::auth::Actor;
use crate::utils::access::{ensure_user_role, push_student_visibility};

use super::model::{
    ACHIEVEMENT_COLUMNS, Achievement, AchievementFilterParams, CreateAchievementDto,
    PaginatedAchievementsResponse,
};

/// Teachers and staff see every achievement; students and guardians only
/// their own records.
fn push_achievement_visibility(qb: &mut QueryBuilder<'_, Postgres>, actor: &Actor) {
    push_student_visibility(qb, actor, "a.student_id");
}

fn can_revoke(actor: &Actor, achievement: &Achievement) -> bool {
    actor.is_staff() || achievement.awarded_by == Some(actor.id)
}

pub struct AchievementService;

impl AchievementService {
    #[instrument(skip(db, dto), fields(user.id = %actor.id, student.id = %dto.student_id, db.operation = "INSERT", db.table = "achievements"))]
    pub async fn create_achievement(
        db: &PgPool,
        actor: &Actor,
        dto: CreateAchievementDto,
    ) -> Result<Achievement, AppError> {
        ensure_user_role(db, dto.student_id, Role::Student, "Student").await?;

        let points = dto.points.unwrap_or(0);

        let achievement = sqlx::query_as::<_, Achievement>(&format!(
            "INSERT INTO achievements (student_id, title, description, points, awarded_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ACHIEVEMENT_COLUMNS}"
        ))
        .bind(dto.student_id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(points)
        .bind(actor.id)
        .fetch_one(db)
        .await?;

        metrics::record_achievement_awarded(points);
        info!(achievement.id = %achievement.id, points, "Achievement awarded");

        Ok(achievement)
    }

    #[instrument(skip(db, filters), fields(user.id = %actor.id, user.role = %actor.role, db.operation = "SELECT", db.table = "achievements"))]
    pub async fn get_achievements(
        db: &PgPool,
        actor: &Actor,
        filters: AchievementFilterParams,
    ) -> Result<PaginatedAchievementsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM achievements a WHERE ");
        push_achievement_visibility(&mut count_qb, actor);
        if let Some(student_id) = filters.student_id {
            count_qb.push(" AND a.student_id = ").push_bind(student_id);
        }
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements a WHERE "
        ));
        push_achievement_visibility(&mut data_qb, actor);
        if let Some(student_id) = filters.student_id {
            data_qb.push(" AND a.student_id = ").push_bind(student_id);
        }
        data_qb
            .push(" ORDER BY a.awarded_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let achievements = data_qb
            .build_query_as::<Achievement>()
            .fetch_all(db)
            .await?;

        debug!(total, returned = achievements.len(), "Achievements fetched");

        Ok(PaginatedAchievementsResponse {
            data: achievements,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "DELETE", db.table = "achievements"))]
    pub async fn delete_achievement(
        db: &PgPool,
        actor: &Actor,
        achievement_id: Uuid,
    ) -> Result<(), AppError> {
        let achievement = sqlx::query_as::<_, Achievement>(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = $1"
        ))
        .bind(achievement_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Achievement not found")))?;

        if !can_revoke(actor, &achievement) {
            return Err(AppError::forbidden(
                "Only the awarding teacher or school staff can revoke an achievement",
            ));
        }

        sqlx::query("DELETE FROM achievements WHERE id = $1")
            .bind(achievement.id)
            .execute(db)
            .await?;

        info!(achievement.id = %achievement.id, "Achievement revoked");

        Ok(())
    }
}
