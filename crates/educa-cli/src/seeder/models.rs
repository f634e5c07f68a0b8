//! Seed records and seeding configuration.

use chrono::{DateTime, Utc};
use educa_models::Role;
use uuid::Uuid;

/// Every seeded account uses this domain, which is how `clear-seed` finds them.
pub const SEED_EMAIL_DOMAIN: &str = "example.com";

/// Marks seeded classes so they can be cleared.
pub const SEED_CLASS_DESCRIPTION: &str = "Turma gerada pelo seeder";

pub struct UserSeed {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub struct ClassSeed {
    pub name: String,
    pub year: i32,
    pub teacher_id: Option<Uuid>,
}

pub struct TaskSeed {
    pub class_id: Uuid,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub max_score: f64,
}

pub struct SubmissionSeed {
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub late: bool,
    pub score: Option<f64>,
    pub graded_by: Option<Uuid>,
}

/// How much data `seed` generates.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub classes: usize,
    pub teachers: usize,
    pub managers: usize,
    pub students_per_class: usize,
    pub tasks_per_class: usize,
    /// Fraction of student/task pairs that get a submission (0.0..=1.0)
    pub submission_rate: f64,
    /// Fraction of students that get a guardian (0.0..=1.0)
    pub guardian_rate: f64,
    pub password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            classes: 4,
            teachers: 3,
            managers: 1,
            students_per_class: 20,
            tasks_per_class: 5,
            submission_rate: 0.7,
            guardian_rate: 0.5,
            password: "password123".to_string(),
        }
    }
}

impl SeedConfig {
    pub fn total_students(&self) -> usize {
        self.classes * self.students_per_class
    }

    pub fn total_tasks(&self) -> usize {
        self.classes * self.tasks_per_class
    }
}
