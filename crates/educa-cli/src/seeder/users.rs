//! User generation and batch insertion.

use std::time::Instant;

use educa_models::Role;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{SEED_EMAIL_DOMAIN, UserSeed};

// 4 binds per row, well under the 65535 parameter limit.
const BATCH_SIZE: usize = 1000;

fn role_prefix(role: Role) -> &'static str {
    match role {
        Role::Administrator => "admin",
        Role::Teacher => "professor",
        Role::Student => "aluno",
        Role::Manager => "gestor",
        Role::Guardian => "responsavel",
    }
}

/// Generates `count` users of `role` in parallel.
///
/// Emails embed the role and index so they never collide within a run.
pub fn generate_users(role: Role, count: usize, password_hash: &str) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let local: String = format!("{first_name}.{last_name}")
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
                .collect();

            UserSeed {
                name: format!("{first_name} {last_name}"),
                email: format!("{local}+{}{idx}@{SEED_EMAIL_DOMAIN}", role_prefix(role)),
                password_hash: password_hash.to_string(),
                role,
            }
        })
        .collect()
}

/// Inserts users in one transaction, returning their ids in input order.
///
/// Users whose email already exists are skipped and absent from the result.
pub async fn insert_users_batch(db: &PgPool, users: &[UserSeed]) -> anyhow::Result<Vec<Uuid>> {
    let start_time = Instant::now();
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO users (name, email, password, role) ");
        qb.push_values(chunk, |mut row, user| {
            row.push_bind(&user.name)
                .push_bind(&user.email)
                .push_bind(&user.password_hash)
                .push_bind(user.role);
        });
        qb.push(" ON CONFLICT (email) DO NOTHING RETURNING id");

        let chunk_ids = qb.build_query_scalar::<Uuid>().fetch_all(&mut *tx).await?;
        ids.extend(chunk_ids);
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} users in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids)
}

/// Links each guardian to one or two consecutive students.
pub async fn link_guardians(
    db: &PgPool,
    guardian_ids: &[Uuid],
    student_ids: &[Uuid],
) -> anyhow::Result<u64> {
    if guardian_ids.is_empty() || student_ids.is_empty() {
        return Ok(0);
    }

    let links: Vec<(Uuid, Uuid)> = guardian_ids
        .iter()
        .enumerate()
        .flat_map(|(idx, &guardian_id)| {
            let first = (idx * 2) % student_ids.len();
            let second = (first + 1) % student_ids.len();
            let mut pairs = vec![(guardian_id, student_ids[first])];
            if idx % 3 == 0 && second != first {
                pairs.push((guardian_id, student_ids[second]));
            }
            pairs
        })
        .collect();

    let mut linked = 0;
    for chunk in links.chunks(BATCH_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO guardian_students (guardian_id, student_id) ",
        );
        qb.push_values(chunk, |mut row, (guardian_id, student_id)| {
            row.push_bind(*guardian_id).push_bind(*student_id);
        });
        qb.push(" ON CONFLICT DO NOTHING");
        linked += qb.build().execute(db).await?.rows_affected();
    }

    Ok(linked)
}

/// Deletes every seeded account. Cascades remove their enrollments,
/// submissions, forum posts, achievements and guardian links.
pub async fn clear_users(db: &PgPool) -> anyhow::Result<u64> {
    let deleted = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(format!("%@{SEED_EMAIL_DOMAIN}"))
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_emails_are_unique_and_tagged() {
        let users = generate_users(Role::Student, 200, "hash");
        assert_eq!(users.len(), 200);

        let emails: HashSet<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails.len(), 200);
        assert!(users.iter().all(|u| u.email.ends_with("@example.com")));
        assert!(users.iter().all(|u| u.email.contains("+aluno")));
        assert!(users.iter().all(|u| u.role == Role::Student));
    }
}
