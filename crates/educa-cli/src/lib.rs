//! # Educa CLI
//!
//! Administration and maintenance tooling for Educa+, used by the
//! `educa-cli` binary.
//!
//! - [`seeder`]: Fake users, classes, enrollments, tasks and submissions
//! - [`integrity`]: Cross-table consistency checks
//! - [`keepalive`]: Periodic database ping
//!
//! ```ignore
//! use educa_cli::seeder::{seed_all, SeedConfig};
//!
//! seed_all(&pool, SeedConfig::default()).await?;
//! ```

pub mod integrity;
pub mod keepalive;
pub mod seeder;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use educa_core::hash_password;
use educa_models::Role;

/// Connects to `DATABASE_URL` with a small pool suited to one-off commands.
pub async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Creates an administrator account. Fails if the email is already taken.
pub async fn create_admin(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let hashed_password = hash_password(password).map_err(|e| e.error)?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, email, password, role)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(&hashed_password)
    .bind(Role::Administrator)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| anyhow::anyhow!("User with this email already exists"))
}
