//! Cross-table consistency checks.
//!
//! The database enforces foreign keys but not the role rules around them: an
//! enrollment may point at a teacher, a class at a student, and so on. The
//! check loads the relevant id sets into memory once and reports every row
//! breaking one of those rules.

use std::collections::{HashMap, HashSet};
use std::fmt;

use educa_models::Role;
use educa_models::enrollments::EnrollmentStatus;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassRow {
    pub id: Uuid,
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub class_id: Uuid,
    pub max_score: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GuardianLinkRow {
    pub guardian_id: Uuid,
    pub student_id: Uuid,
}

/// Everything the checks look at.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub roles: HashMap<Uuid, Role>,
    pub classes: Vec<ClassRow>,
    pub enrollments: Vec<EnrollmentRow>,
    pub tasks: Vec<TaskRow>,
    pub submissions: Vec<SubmissionRow>,
    pub guardian_links: Vec<GuardianLinkRow>,
}

impl Snapshot {
    pub async fn load(db: &PgPool) -> Result<Self, sqlx::Error> {
        let roles = sqlx::query_as::<_, (Uuid, Role)>("SELECT id, role FROM users")
            .fetch_all(db)
            .await?
            .into_iter()
            .collect();

        let classes = sqlx::query_as::<_, ClassRow>("SELECT id, teacher_id FROM classes")
            .fetch_all(db)
            .await?;
        let enrollments = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT id, student_id, class_id, status FROM enrollments",
        )
        .fetch_all(db)
        .await?;
        let tasks = sqlx::query_as::<_, TaskRow>("SELECT id, class_id, max_score FROM tasks")
            .fetch_all(db)
            .await?;
        let submissions = sqlx::query_as::<_, SubmissionRow>(
            "SELECT id, task_id, student_id, score FROM submissions",
        )
        .fetch_all(db)
        .await?;
        let guardian_links = sqlx::query_as::<_, GuardianLinkRow>(
            "SELECT guardian_id, student_id FROM guardian_students",
        )
        .fetch_all(db)
        .await?;

        Ok(Self {
            roles,
            classes,
            enrollments,
            tasks,
            submissions,
            guardian_links,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    EnrollmentOfNonStudent {
        enrollment_id: Uuid,
        user_id: Uuid,
        role: Role,
    },
    TeacherNotProfessor {
        class_id: Uuid,
        user_id: Uuid,
        role: Role,
    },
    SubmissionWithoutEnrollment {
        submission_id: Uuid,
        student_id: Uuid,
        class_id: Uuid,
    },
    GuardianLinkRole {
        guardian_id: Uuid,
        student_id: Uuid,
        guardian_role: Role,
        student_role: Role,
    },
    ScoreAboveMax {
        submission_id: Uuid,
        score: f64,
        max_score: f64,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnrollmentOfNonStudent {
                enrollment_id,
                user_id,
                role,
            } => write!(
                f,
                "enrollment {enrollment_id}: user {user_id} has role {role}, expected ALUNO"
            ),
            Self::TeacherNotProfessor {
                class_id,
                user_id,
                role,
            } => write!(
                f,
                "class {class_id}: teacher {user_id} has role {role}, expected PROFESSOR"
            ),
            Self::SubmissionWithoutEnrollment {
                submission_id,
                student_id,
                class_id,
            } => write!(
                f,
                "submission {submission_id}: student {student_id} is not actively enrolled in class {class_id}"
            ),
            Self::GuardianLinkRole {
                guardian_id,
                student_id,
                guardian_role,
                student_role,
            } => write!(
                f,
                "guardian link {guardian_id} -> {student_id}: roles are {guardian_role} -> {student_role}, expected RESPONSAVEL -> ALUNO"
            ),
            Self::ScoreAboveMax {
                submission_id,
                score,
                max_score,
            } => write!(
                f,
                "submission {submission_id}: score {score} exceeds task maximum {max_score}"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn check(snapshot: &Snapshot) -> Self {
        let mut issues = Vec::new();
        let role_of = |id: &Uuid| snapshot.roles.get(id).copied();

        for enrollment in &snapshot.enrollments {
            if let Some(role) = role_of(&enrollment.student_id)
                && role != Role::Student
            {
                issues.push(IntegrityIssue::EnrollmentOfNonStudent {
                    enrollment_id: enrollment.id,
                    user_id: enrollment.student_id,
                    role,
                });
            }
        }

        for class in &snapshot.classes {
            if let Some(teacher_id) = class.teacher_id
                && let Some(role) = role_of(&teacher_id)
                && role != Role::Teacher
            {
                issues.push(IntegrityIssue::TeacherNotProfessor {
                    class_id: class.id,
                    user_id: teacher_id,
                    role,
                });
            }
        }

        let active: HashSet<(Uuid, Uuid)> = snapshot
            .enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .map(|e| (e.student_id, e.class_id))
            .collect();
        let tasks: HashMap<Uuid, &TaskRow> = snapshot.tasks.iter().map(|t| (t.id, t)).collect();

        for submission in &snapshot.submissions {
            let Some(task) = tasks.get(&submission.task_id) else {
                continue;
            };
            if !active.contains(&(submission.student_id, task.class_id)) {
                issues.push(IntegrityIssue::SubmissionWithoutEnrollment {
                    submission_id: submission.id,
                    student_id: submission.student_id,
                    class_id: task.class_id,
                });
            }
            if let Some(score) = submission.score
                && score > task.max_score
            {
                issues.push(IntegrityIssue::ScoreAboveMax {
                    submission_id: submission.id,
                    score,
                    max_score: task.max_score,
                });
            }
        }

        for link in &snapshot.guardian_links {
            if let (Some(guardian_role), Some(student_role)) =
                (role_of(&link.guardian_id), role_of(&link.student_id))
                && (guardian_role != Role::Guardian || student_role != Role::Student)
            {
                issues.push(IntegrityIssue::GuardianLinkRole {
                    guardian_id: link.guardian_id,
                    student_id: link.student_id,
                    guardian_role,
                    student_role,
                });
            }
        }

        Self { issues }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
