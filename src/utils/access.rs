//! Ownership and membership checks shared by the academic modules.
//!
//! Role layers on the routers decide *who may call* an endpoint; the helpers
//! here decide *which rows* a caller may see or touch:
//!
//! - staff (administrators and managers) see every class
//! - teachers see the classes they teach
//! - students see the classes they are actively enrolled in
//! - guardians see the classes their linked students are actively enrolled in

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use educa_core::AppError;
use educa_models::Role;
use educa_models::classes::{CLASS_COLUMNS, Class};

use crate::middleware::auth::Actor;

/// Appends a boolean SQL condition restricting `class_column` to the classes
/// `actor` may see.
pub fn push_class_visibility(
    qb: &mut QueryBuilder<'_, Postgres>,
    actor: &Actor,
    class_column: &str,
) {
    match actor.role {
        Role::Administrator | Role::Manager => {
            qb.push("TRUE");
        }
        Role::Teacher => {
            qb.push(format!(
                "EXISTS (SELECT 1 FROM classes vc WHERE vc.id = {class_column} AND vc.teacher_id = "
            ));
            qb.push_bind(actor.id);
            qb.push(")");
        }
        Role::Student => {
            qb.push(format!(
                "EXISTS (SELECT 1 FROM enrollments ve WHERE ve.class_id = {class_column} \
                 AND ve.status = 'ATIVA' AND ve.student_id = "
            ));
            qb.push_bind(actor.id);
            qb.push(")");
        }
        Role::Guardian => {
            qb.push(format!(
                "EXISTS (SELECT 1 FROM enrollments ve \
                 JOIN guardian_students vg ON vg.student_id = ve.student_id \
                 WHERE ve.class_id = {class_column} AND ve.status = 'ATIVA' AND vg.guardian_id = "
            ));
            qb.push_bind(actor.id);
            qb.push(")");
        }
    }
}

/// Appends a boolean SQL condition restricting `student_column` to the
/// students whose personal records (submissions, achievements) `actor` may see.
///
/// Teachers and staff are unrestricted here; record types tied to a class
/// scope teachers with [`push_class_visibility`] instead.
pub fn push_student_visibility(
    qb: &mut QueryBuilder<'_, Postgres>,
    actor: &Actor,
    student_column: &str,
) {
    match actor.role {
        Role::Administrator | Role::Manager | Role::Teacher => {
            qb.push("TRUE");
        }
        Role::Student => {
            qb.push(format!("{student_column} = "));
            qb.push_bind(actor.id);
        }
        Role::Guardian => {
            qb.push(format!(
                "EXISTS (SELECT 1 FROM guardian_students vg \
                 WHERE vg.student_id = {student_column} AND vg.guardian_id = "
            ));
            qb.push_bind(actor.id);
            qb.push(")");
        }
    }
}

pub async fn fetch_class(db: &PgPool, class_id: Uuid) -> Result<Class, AppError> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"
    ))
    .bind(class_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
}

pub async fn can_view_class(db: &PgPool, actor: &Actor, class_id: Uuid) -> Result<bool, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT EXISTS (SELECT 1 FROM classes c WHERE c.id = ");
    qb.push_bind(class_id);
    qb.push(" AND ");
    push_class_visibility(&mut qb, actor, "c.id");
    qb.push(")");

    let visible = qb.build_query_scalar::<bool>().fetch_one(db).await?;
    debug!(class.id = %class_id, user.id = %actor.id, visible, "Checked class visibility");

    Ok(visible)
}

/// Loads a class the actor may see. Invisible classes are reported as missing.
pub async fn fetch_visible_class(
    db: &PgPool,
    actor: &Actor,
    class_id: Uuid,
) -> Result<Class, AppError> {
    if !can_view_class(db, actor, class_id).await? {
        return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
    }
    fetch_class(db, class_id).await
}

/// Whether `actor` may manage the class: staff, or the teacher assigned to it.
#[must_use]
pub fn can_manage_class(actor: &Actor, class: &Class) -> bool {
    actor.is_staff() || (actor.role == Role::Teacher && class.teacher_id == Some(actor.id))
}

pub fn ensure_can_manage_class(actor: &Actor, class: &Class) -> Result<(), AppError> {
    if can_manage_class(actor, class) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Only the class teacher or school staff can perform this action",
        ))
    }
}

pub async fn is_enrolled(db: &PgPool, student_id: Uuid, class_id: Uuid) -> Result<bool, AppError> {
    let enrolled = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM enrollments
         WHERE student_id = $1 AND class_id = $2 AND status = 'ATIVA')",
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_one(db)
    .await?;

    Ok(enrolled)
}

pub async fn is_guardian_of(
    db: &PgPool,
    guardian_id: Uuid,
    student_id: Uuid,
) -> Result<bool, AppError> {
    let linked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM guardian_students WHERE guardian_id = $1 AND student_id = $2)",
    )
    .bind(guardian_id)
    .bind(student_id)
    .fetch_one(db)
    .await?;

    Ok(linked)
}

/// Whether `actor` may post in the class: staff, the class teacher, or an
/// actively enrolled student. Guardians never may.
pub async fn is_class_member(db: &PgPool, actor: &Actor, class: &Class) -> Result<bool, AppError> {
    match actor.role {
        Role::Administrator | Role::Manager | Role::Teacher => Ok(can_manage_class(actor, class)),
        Role::Student => is_enrolled(db, actor.id, class.id).await,
        Role::Guardian => Ok(false),
    }
}

/// Checks that `user_id` exists and has `expected` role.
///
/// A missing user is a 404 and a user with another role a 400, both worded
/// with `label` (e.g. "Student").
pub async fn ensure_user_role(
    db: &PgPool,
    user_id: Uuid,
    expected: Role,
    label: &str,
) -> Result<(), AppError> {
    let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("{label} not found")))?;

    if role != expected {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "{label} must have role {expected}, found {role}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    fn class_taught_by(teacher_id: Option<Uuid>) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: "7º Ano A".to_string(),
            description: None,
            year: 2025,
            teacher_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn visibility_sql(role: Role) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM classes c WHERE ");
        push_class_visibility(&mut qb, &actor(role), "c.id");
        qb.sql().to_string()
    }

    #[test]
    fn test_staff_see_every_class() {
        assert!(visibility_sql(Role::Administrator).ends_with("WHERE TRUE"));
        assert!(visibility_sql(Role::Manager).ends_with("WHERE TRUE"));
    }

    #[test]
    fn test_teacher_visibility_uses_teacher_id() {
        let sql = visibility_sql(Role::Teacher);
        assert!(sql.contains("vc.id = c.id AND vc.teacher_id = $1"));
    }

    #[test]
    fn test_student_visibility_requires_active_enrollment() {
        let sql = visibility_sql(Role::Student);
        assert!(sql.contains("ve.class_id = c.id"));
        assert!(sql.contains("ve.status = 'ATIVA'"));
        assert!(sql.contains("ve.student_id = $1"));
    }

    #[test]
    fn test_guardian_visibility_goes_through_links() {
        let sql = visibility_sql(Role::Guardian);
        assert!(sql.contains("JOIN guardian_students vg"));
        assert!(sql.contains("vg.guardian_id = $1"));
    }

    #[test]
    fn test_student_records_visibility() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM submissions s WHERE ");
        push_student_visibility(&mut qb, &actor(Role::Student), "s.student_id");
        assert!(qb.sql().ends_with("s.student_id = $1"));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM submissions s WHERE ");
        push_student_visibility(&mut qb, &actor(Role::Guardian), "s.student_id");
        assert!(qb.sql().contains("vg.student_id = s.student_id"));

        for role in [Role::Administrator, Role::Manager, Role::Teacher] {
            let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM achievements a WHERE ");
            push_student_visibility(&mut qb, &actor(role), "a.student_id");
            assert!(qb.sql().ends_with("WHERE TRUE"), "role {role}");
        }
    }

    #[test]
    fn test_can_manage_class() {
        let teacher = actor(Role::Teacher);
        assert!(can_manage_class(&teacher, &class_taught_by(Some(teacher.id))));
        assert!(!can_manage_class(&teacher, &class_taught_by(Some(Uuid::new_v4()))));
        assert!(!can_manage_class(&teacher, &class_taught_by(None)));

        assert!(can_manage_class(&actor(Role::Manager), &class_taught_by(None)));
        assert!(can_manage_class(&actor(Role::Administrator), &class_taught_by(None)));
    }

    #[test]
    fn test_students_and_guardians_never_manage() {
        let student = actor(Role::Student);
        let class = class_taught_by(Some(student.id));
        assert!(!can_manage_class(&student, &class));
        assert!(ensure_can_manage_class(&actor(Role::Guardian), &class).is_err());
    }
}
