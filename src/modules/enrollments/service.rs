use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};
use educa_models::Role;

use crate::utils::access::{ensure_user_role, fetch_class};

use super::model::{
    CreateEnrollmentDto, ENROLLMENT_COLUMNS, Enrollment, EnrollmentDetail, EnrollmentFilterParams,
    EnrollmentStatus, PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};

const ALREADY_ENROLLED: &str = "Student is already enrolled in this class";

fn push_enrollment_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &EnrollmentFilterParams) {
    if let Some(class_id) = filters.class_id {
        qb.push(" AND e.class_id = ").push_bind(class_id);
    }
    if let Some(student_id) = filters.student_id {
        qb.push(" AND e.student_id = ").push_bind(student_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND e.status = ").push_bind(status);
    }
}

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls a student in a class.
    ///
    /// A cancelled enrollment for the same pair is reactivated instead of
    /// creating a second row.
    #[instrument(skip(db, dto), fields(student.id = %dto.student_id, class.id = %dto.class_id, db.table = "enrollments"))]
    pub async fn create_enrollment(
        db: &PgPool,
        dto: CreateEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        ensure_user_role(db, dto.student_id, Role::Student, "Student").await?;
        fetch_class(db, dto.class_id).await?;

        let existing = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = $1 AND class_id = $2"
        ))
        .bind(dto.student_id)
        .bind(dto.class_id)
        .fetch_optional(db)
        .await?;

        match existing {
            Some(enrollment) if enrollment.status == EnrollmentStatus::Active => {
                warn!(enrollment.id = %enrollment.id, "Duplicate enrollment");
                Err(AppError::conflict(anyhow::anyhow!(ALREADY_ENROLLED)))
            }
            Some(enrollment) => {
                let reactivated = Self::set_status(db, enrollment.id, EnrollmentStatus::Active)
                    .await?;
                info!(enrollment.id = %reactivated.id, "Cancelled enrollment reactivated");
                Ok(reactivated)
            }
            None => {
                let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
                    "INSERT INTO enrollments (student_id, class_id)
                     VALUES ($1, $2)
                     RETURNING {ENROLLMENT_COLUMNS}"
                ))
                .bind(dto.student_id)
                .bind(dto.class_id)
                .fetch_one(db)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(db_err) = &e
                        && db_err.is_unique_violation()
                    {
                        return AppError::conflict(anyhow::anyhow!(ALREADY_ENROLLED));
                    }
                    AppError::from(e)
                })?;

                info!(enrollment.id = %enrollment.id, "Student enrolled");
                Ok(enrollment)
            }
        }
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "enrollments"))]
    pub async fn get_enrollments(
        db: &PgPool,
        filters: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM enrollments e WHERE 1=1");
        push_enrollment_filters(&mut count_qb, &filters);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb = QueryBuilder::<Postgres>::new(
            "SELECT e.id, e.student_id, u.name AS student_name, e.class_id, c.name AS class_name,
                    e.status, e.created_at
             FROM enrollments e
             JOIN users u ON u.id = e.student_id
             JOIN classes c ON c.id = e.class_id
             WHERE 1=1",
        );
        push_enrollment_filters(&mut data_qb, &filters);
        data_qb
            .push(" ORDER BY c.name ASC, u.name ASC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let enrollments = data_qb
            .build_query_as::<EnrollmentDetail>()
            .fetch_all(db)
            .await?;

        debug!(total, returned = enrollments.len(), "Enrollments fetched");

        Ok(PaginatedEnrollmentsResponse {
            data: enrollments,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(status = %dto.status.as_str(), db.operation = "UPDATE", db.table = "enrollments"))]
    pub async fn update_enrollment(
        db: &PgPool,
        enrollment_id: Uuid,
        dto: UpdateEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        let enrollment = Self::set_status(db, enrollment_id, dto.status).await?;
        info!(enrollment.id = %enrollment.id, "Enrollment status updated");
        Ok(enrollment)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "enrollments"))]
    pub async fn delete_enrollment(db: &PgPool, enrollment_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(enrollment_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Enrollment not found")));
        }

        info!(enrollment.id = %enrollment_id, "Enrollment deleted");

        Ok(())
    }

    async fn set_status(
        db: &PgPool,
        enrollment_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "UPDATE enrollments SET status = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(status)
        .bind(enrollment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))
    }
}
