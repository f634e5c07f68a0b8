use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta, hash_password};
use educa_models::Role;

use crate::metrics;
use crate::utils::access::ensure_user_role;

use super::model::{
    CreateUserDto, LinkedStudent, PaginatedUsersResponse, USER_COLUMNS, UpdateUserDto, User,
    UserFilterParams,
};

fn map_email_conflict(e: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!(user.email = %email, "Email already in use");
        return AppError::bad_request(anyhow::anyhow!("Email already exists"));
    }
    error!(error = %e, "Database error writing user");
    AppError::from(e)
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserFilterParams) {
    if let Some(role) = filters.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(name) = filters.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let pattern = format!("%{name}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(user.email = %dto.email, user.role = %dto.role, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let email = dto.email.trim().to_lowercase();
        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(dto.name.trim())
        .bind(&email)
        .bind(&hashed_password)
        .bind(dto.role)
        .fetch_one(db)
        .await
        .map_err(|e| map_email_conflict(e, &email))?;

        metrics::record_user_created(user.role.as_str());
        info!(user.id = %user.id, "User created");

        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_user_filters(&mut count_qb, &filters);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1"));
        push_user_filters(&mut data_qb, &filters);
        data_qb
            .push(" ORDER BY name ASC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let users = data_qb.build_query_as::<User>().fetch_all(db).await?;

        debug!(total, returned = users.len(), "Users fetched");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_user(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let email = dto.email.as_deref().map(|e| e.trim().to_lowercase());

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                role = COALESCE($3, role),
                active = COALESCE($4, active),
                updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(email.as_deref())
        .bind(dto.role)
        .bind(dto.active)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(|e| map_email_conflict(e, email.as_deref().unwrap_or_default()))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        info!(user.id = %user.id, "User updated");

        Ok(user)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "users"))]
    pub async fn delete_user(db: &PgPool, actor_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if actor_id == user_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        info!(user.id = %user_id, "User deleted");

        Ok(())
    }

    /// Links a student to a guardian. Linking an already linked pair is a no-op.
    #[instrument(skip(db), fields(db.operation = "INSERT", db.table = "guardian_students"))]
    pub async fn link_student(
        db: &PgPool,
        guardian_id: Uuid,
        student_id: Uuid,
    ) -> Result<LinkedStudent, AppError> {
        ensure_user_role(db, guardian_id, Role::Guardian, "Guardian").await?;
        ensure_user_role(db, student_id, Role::Student, "Student").await?;

        let inserted = sqlx::query(
            "INSERT INTO guardian_students (guardian_id, student_id)
             VALUES ($1, $2)
             ON CONFLICT (guardian_id, student_id) DO NOTHING",
        )
        .bind(guardian_id)
        .bind(student_id)
        .execute(db)
        .await?
        .rows_affected();

        if inserted == 0 {
            debug!(guardian.id = %guardian_id, student.id = %student_id, "Link already exists");
        } else {
            info!(guardian.id = %guardian_id, student.id = %student_id, "Student linked to guardian");
        }

        let linked = sqlx::query_as::<_, LinkedStudent>(
            "SELECT u.id, u.name, u.email, gs.created_at AS linked_at
             FROM guardian_students gs
             JOIN users u ON u.id = gs.student_id
             WHERE gs.guardian_id = $1 AND gs.student_id = $2",
        )
        .bind(guardian_id)
        .bind(student_id)
        .fetch_one(db)
        .await?;

        Ok(linked)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "guardian_students"))]
    pub async fn unlink_student(
        db: &PgPool,
        guardian_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM guardian_students WHERE guardian_id = $1 AND student_id = $2")
                .bind(guardian_id)
                .bind(student_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Student is not linked to this guardian"
            )));
        }

        info!(guardian.id = %guardian_id, student.id = %student_id, "Student unlinked from guardian");

        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "guardian_students"))]
    pub async fn get_linked_students(
        db: &PgPool,
        guardian_id: Uuid,
    ) -> Result<Vec<LinkedStudent>, AppError> {
        ensure_user_role(db, guardian_id, Role::Guardian, "Guardian").await?;

        let students = sqlx::query_as::<_, LinkedStudent>(
            "SELECT u.id, u.name, u.email, gs.created_at AS linked_at
             FROM guardian_students gs
             JOIN users u ON u.id = gs.student_id
             WHERE gs.guardian_id = $1
             ORDER BY u.name ASC",
        )
        .bind(guardian_id)
        .fetch_all(db)
        .await?;

        Ok(students)
    }
}
