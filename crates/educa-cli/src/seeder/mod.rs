//! Development data seeding.
//!
//! Rows are generated in parallel with rayon and `fake`, then inserted in
//! batches. Seeded accounts all use the `example.com` domain and share one
//! password, so `clear_all` can remove them again.

pub mod academics;
pub mod models;
pub mod users;

use std::time::Instant;

use chrono::Utc;
use educa_core::hash_password;
use educa_models::Role;
use sqlx::PgPool;

pub use models::SeedConfig;

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let now = Utc::now();
    println!("🌱 Seeding database with {config:?}");

    let password_hash = hash_password(&config.password).map_err(|e| e.error)?;

    println!("👥 Seeding users...");
    let manager_ids = users::insert_users_batch(
        db,
        &users::generate_users(Role::Manager, config.managers, &password_hash),
    )
    .await?;
    let teacher_ids = users::insert_users_batch(
        db,
        &users::generate_users(Role::Teacher, config.teachers, &password_hash),
    )
    .await?;
    let student_ids = users::insert_users_batch(
        db,
        &users::generate_users(Role::Student, config.total_students(), &password_hash),
    )
    .await?;

    let guardian_count =
        (config.total_students() as f64 * config.guardian_rate.clamp(0.0, 1.0)).round() as usize;
    let guardian_ids = users::insert_users_batch(
        db,
        &users::generate_users(Role::Guardian, guardian_count, &password_hash),
    )
    .await?;
    let links = users::link_guardians(db, &guardian_ids, &student_ids).await?;
    println!("   ✓ Linked {links} guardian/student pairs");

    println!("🏫 Seeding classes and enrollments...");
    let classes = academics::insert_classes(
        db,
        &academics::generate_classes(
            config.classes,
            &teacher_ids,
            academics::current_school_year(),
        ),
    )
    .await?;
    let class_ids: Vec<_> = classes.iter().map(|(id, _)| *id).collect();
    let roster = academics::assign_students(&class_ids, &student_ids, config.students_per_class);
    let enrolled = academics::insert_enrollments(db, &roster).await?;
    println!("   ✓ Created {} classes and {enrolled} enrollments", classes.len());

    println!("📝 Seeding tasks and submissions...");
    let tasks = academics::insert_tasks(
        db,
        &academics::generate_tasks(&classes, config.tasks_per_class, now),
    )
    .await?;
    println!("   ✓ Created {} tasks", tasks.len());

    let submissions =
        academics::generate_submissions(&tasks, &roster, config.submission_rate, now);
    academics::insert_submissions(db, &submissions).await?;

    println!(
        "\n✅ Seeded {} users in {:?} (password: {})",
        manager_ids.len() + teacher_ids.len() + student_ids.len() + guardian_ids.len(),
        start_time.elapsed(),
        config.password
    );

    Ok(())
}

/// Removes seeded classes and accounts. Manually created data is kept.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    println!("🗑️  Clearing seeded data...");

    let deleted_classes = academics::clear_classes(db).await?;
    let deleted_users = users::clear_users(db).await?;

    println!("✅ Deleted {deleted_classes} classes and {deleted_users} users");

    Ok(())
}
