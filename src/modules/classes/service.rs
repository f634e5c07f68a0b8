use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};
use educa_models::Role;

use crate::middleware::auth::Actor;
use crate::utils::access::{
    ensure_can_manage_class, ensure_user_role, fetch_class, push_class_visibility,
};

use super::model::{
    CLASS_COLUMNS, Class, ClassFilterParams, ClassWithStats, CreateClassDto,
    PaginatedClassesResponse, RosterEntry, UpdateClassDto,
};

const CLASS_WITH_STATS_SELECT: &str = "SELECT c.id, c.name, c.description, c.year, c.teacher_id,
        t.name AS teacher_name,
        (SELECT COUNT(*) FROM enrollments e WHERE e.class_id = c.id AND e.status = 'ATIVA') AS student_count,
        c.created_at, c.updated_at
     FROM classes c
     LEFT JOIN users t ON t.id = c.teacher_id
     WHERE ";

fn push_class_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ClassFilterParams) {
    if let Some(name) = filters.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(" AND c.name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(year) = filters.year {
        qb.push(" AND c.year = ").push_bind(year);
    }
    if let Some(teacher_id) = filters.teacher_id {
        qb.push(" AND c.teacher_id = ").push_bind(teacher_id);
    }
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(class.name = %dto.name, db.operation = "INSERT", db.table = "classes"))]
    pub async fn create_class(db: &PgPool, dto: CreateClassDto) -> Result<Class, AppError> {
        if let Some(teacher_id) = dto.teacher_id {
            ensure_user_role(db, teacher_id, Role::Teacher, "Teacher").await?;
        }

        let class = sqlx::query_as::<_, Class>(&format!(
            "INSERT INTO classes (name, description, year, teacher_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.year)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await?;

        info!(class.id = %class.id, "Class created");

        Ok(class)
    }

    #[instrument(skip(db, filters), fields(user.id = %actor.id, user.role = %actor.role, db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_classes(
        db: &PgPool,
        actor: &Actor,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classes c WHERE ");
        push_class_visibility(&mut count_qb, actor, "c.id");
        push_class_filters(&mut count_qb, &filters);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb = QueryBuilder::<Postgres>::new(CLASS_WITH_STATS_SELECT);
        push_class_visibility(&mut data_qb, actor, "c.id");
        push_class_filters(&mut data_qb, &filters);
        data_qb
            .push(" ORDER BY c.year DESC, c.name ASC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let classes = data_qb
            .build_query_as::<ClassWithStats>()
            .fetch_all(db)
            .await?;

        debug!(total, returned = classes.len(), "Classes fetched");

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    /// Classes the actor may not see are reported as not found.
    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_class(
        db: &PgPool,
        actor: &Actor,
        class_id: Uuid,
    ) -> Result<ClassWithStats, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(CLASS_WITH_STATS_SELECT);
        push_class_visibility(&mut qb, actor, "c.id");
        qb.push(" AND c.id = ").push_bind(class_id);

        qb.build_query_as::<ClassWithStats>()
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "classes"))]
    pub async fn update_class(
        db: &PgPool,
        class_id: Uuid,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        if let Some(teacher_id) = dto.teacher_id {
            ensure_user_role(db, teacher_id, Role::Teacher, "Teacher").await?;
        }

        let class = sqlx::query_as::<_, Class>(&format!(
            "UPDATE classes SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                year = COALESCE($3, year),
                teacher_id = COALESCE($4, teacher_id),
                updated_at = NOW()
             WHERE id = $5
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.year)
        .bind(dto.teacher_id)
        .bind(class_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        info!(class.id = %class.id, "Class updated");

        Ok(class)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "classes"))]
    pub async fn delete_class(db: &PgPool, class_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }

        info!(class.id = %class_id, "Class deleted");

        Ok(())
    }

    /// Actively enrolled students of a class, for its teacher or staff.
    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "enrollments"))]
    pub async fn get_roster(
        db: &PgPool,
        actor: &Actor,
        class_id: Uuid,
    ) -> Result<Vec<RosterEntry>, AppError> {
        let class = fetch_class(db, class_id).await?;
        ensure_can_manage_class(actor, &class)?;

        let roster = sqlx::query_as::<_, RosterEntry>(
            "SELECT e.id AS enrollment_id, u.id AS student_id, u.name, u.email,
                    e.created_at AS enrolled_at
             FROM enrollments e
             JOIN users u ON u.id = e.student_id
             WHERE e.class_id = $1 AND e.status = 'ATIVA'
             ORDER BY u.name ASC",
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use educa_core::PaginationParams;

    #[test]
    fn test_class_filters_sql() {
        let filters = ClassFilterParams {
            name: Some("ano".to_string()),
            year: Some(2025),
            teacher_id: Some(Uuid::new_v4()),
            pagination: PaginationParams::default(),
        };
        let actor = Actor {
            id: Uuid::new_v4(),
            role: Role::Manager,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classes c WHERE ");
        push_class_visibility(&mut qb, &actor, "c.id");
        push_class_filters(&mut qb, &filters);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM classes c WHERE TRUE AND c.name ILIKE $1 AND c.year = $2 AND c.teacher_id = $3"
        );
    }
}
