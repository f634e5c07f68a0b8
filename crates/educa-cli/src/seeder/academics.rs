//! Classes, enrollments, tasks and submissions.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Datelike, Duration, Utc};
use fake::Fake;
use fake::faker::lorem::en::{Paragraph, Sentence};
use rand::Rng;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{ClassSeed, SEED_CLASS_DESCRIPTION, SubmissionSeed, TaskSeed};

const BATCH_SIZE: usize = 1000;
const CLASS_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A task as inserted, with what submission generation needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeededTask {
    pub id: Uuid,
    pub class_id: Uuid,
    pub created_by: Option<Uuid>,
    pub due_date: DateTime<Utc>,
    pub max_score: f64,
}

/// Names classes "6º Ano A", "6º Ano B", ... and assigns teachers round-robin.
pub fn generate_classes(count: usize, teacher_ids: &[Uuid], year: i32) -> Vec<ClassSeed> {
    (0..count)
        .map(|idx| {
            let grade = 6 + (idx / CLASS_LETTERS.len()) % 4;
            let letter = CLASS_LETTERS[idx % CLASS_LETTERS.len()];
            let teacher_id = (!teacher_ids.is_empty()).then(|| teacher_ids[idx % teacher_ids.len()]);

            ClassSeed {
                name: format!("{grade}º Ano {letter}"),
                year,
                teacher_id,
            }
        })
        .collect()
}

pub async fn insert_classes(db: &PgPool, classes: &[ClassSeed]) -> anyhow::Result<Vec<(Uuid, Option<Uuid>)>> {
    if classes.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO classes (name, description, year, teacher_id) ",
    );
    qb.push_values(classes, |mut row, class| {
        row.push_bind(&class.name)
            .push_bind(SEED_CLASS_DESCRIPTION)
            .push_bind(class.year)
            .push_bind(class.teacher_id);
    });
    qb.push(" RETURNING id, teacher_id");

    let rows = qb
        .build_query_as::<(Uuid, Option<Uuid>)>()
        .fetch_all(db)
        .await?;

    Ok(rows)
}

/// Splits students into consecutive groups of `per_class`, one group per class.
pub fn assign_students(
    class_ids: &[Uuid],
    student_ids: &[Uuid],
    per_class: usize,
) -> HashMap<Uuid, Vec<Uuid>> {
    if per_class == 0 {
        return HashMap::new();
    }

    class_ids
        .iter()
        .zip(student_ids.chunks(per_class))
        .map(|(&class_id, students)| (class_id, students.to_vec()))
        .collect()
}

pub async fn insert_enrollments(
    db: &PgPool,
    roster: &HashMap<Uuid, Vec<Uuid>>,
) -> anyhow::Result<u64> {
    let pairs: Vec<(Uuid, Uuid)> = roster
        .iter()
        .flat_map(|(&class_id, students)| students.iter().map(move |&s| (s, class_id)))
        .collect();

    let mut inserted = 0;
    for chunk in pairs.chunks(BATCH_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO enrollments (student_id, class_id) ");
        qb.push_values(chunk, |mut row, (student_id, class_id)| {
            row.push_bind(*student_id).push_bind(*class_id);
        });
        qb.push(" ON CONFLICT (student_id, class_id) DO NOTHING");
        inserted += qb.build().execute(db).await?.rows_affected();
    }

    Ok(inserted)
}

/// Generates tasks spread from two weeks in the past to three weeks ahead.
pub fn generate_tasks(
    classes: &[(Uuid, Option<Uuid>)],
    per_class: usize,
    now: DateTime<Utc>,
) -> Vec<TaskSeed> {
    classes
        .par_iter()
        .flat_map(|&(class_id, teacher_id)| {
            let mut rng = rand::thread_rng();
            (0..per_class)
                .map(|_| {
                    let offset_hours: i64 = rng.gen_range(-14 * 24..21 * 24);
                    TaskSeed {
                        class_id,
                        created_by: teacher_id,
                        title: Sentence(3..6).fake::<String>().trim_end_matches('.').to_string(),
                        description: Paragraph(1..3).fake(),
                        due_date: now + Duration::hours(offset_hours),
                        max_score: 10.0,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn insert_tasks(db: &PgPool, tasks: &[TaskSeed]) -> anyhow::Result<Vec<SeededTask>> {
    let mut seeded = Vec::with_capacity(tasks.len());

    for chunk in tasks.chunks(BATCH_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO tasks (class_id, created_by, title, description, due_date, max_score) ",
        );
        qb.push_values(chunk, |mut row, task| {
            row.push_bind(task.class_id)
                .push_bind(task.created_by)
                .push_bind(&task.title)
                .push_bind(&task.description)
                .push_bind(task.due_date)
                .push_bind(task.max_score);
        });
        qb.push(" RETURNING id, class_id, created_by, due_date, max_score");

        seeded.extend(qb.build_query_as::<SeededTask>().fetch_all(db).await?);
    }

    Ok(seeded)
}

/// Generates submissions for a `rate` fraction of student/task pairs.
///
/// Submissions for past-due tasks are mostly graded; some arrive late.
pub fn generate_submissions(
    tasks: &[SeededTask],
    roster: &HashMap<Uuid, Vec<Uuid>>,
    rate: f64,
    now: DateTime<Utc>,
) -> Vec<SubmissionSeed> {
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };

    tasks
        .par_iter()
        .flat_map(|task| {
            let mut rng = rand::thread_rng();
            let students = roster.get(&task.class_id).map_or(&[][..], Vec::as_slice);

            students
                .iter()
                .filter_map(|&student_id| {
                    if !rng.gen_bool(rate) {
                        return None;
                    }

                    let past_due = task.due_date <= now;
                    let late = past_due && rng.gen_bool(0.15);
                    let submitted_at = if late {
                        task.due_date + Duration::hours(rng.gen_range(1..48))
                    } else {
                        task.due_date - Duration::hours(rng.gen_range(1..72))
                    }
                    .min(now);

                    let score = (past_due && rng.gen_bool(0.8)).then(|| {
                        let raw: f64 = rng.gen_range(0.0..=task.max_score);
                        (raw * 2.0).round() / 2.0
                    });

                    Some(SubmissionSeed {
                        task_id: task.id,
                        student_id,
                        content: Paragraph(1..4).fake(),
                        submitted_at,
                        late: submitted_at > task.due_date,
                        score,
                        graded_by: score.and(task.created_by),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn insert_submissions(db: &PgPool, submissions: &[SubmissionSeed]) -> anyhow::Result<u64> {
    let start_time = Instant::now();
    let mut inserted = 0;

    for chunk in submissions.chunks(BATCH_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO submissions
                (task_id, student_id, content, submitted_at, late, score, graded_at, graded_by) ",
        );
        qb.push_values(chunk, |mut row, s| {
            let graded_at = s.score.map(|_| s.submitted_at + Duration::days(1));
            row.push_bind(s.task_id)
                .push_bind(s.student_id)
                .push_bind(&s.content)
                .push_bind(s.submitted_at)
                .push_bind(s.late)
                .push_bind(s.score)
                .push_bind(graded_at)
                .push_bind(s.graded_by);
        });
        qb.push(" ON CONFLICT (task_id, student_id) DO NOTHING");
        inserted += qb.build().execute(db).await?.rows_affected();
    }

    println!(
        "   ✓ Inserted {} submissions in {:?}",
        inserted,
        start_time.elapsed()
    );

    Ok(inserted)
}

/// Deletes seeded classes; their enrollments, tasks and submissions cascade.
pub async fn clear_classes(db: &PgPool) -> anyhow::Result<u64> {
    let deleted = sqlx::query("DELETE FROM classes WHERE description = $1")
        .bind(SEED_CLASS_DESCRIPTION)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted)
}

pub fn current_school_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_classes_round_robin_teachers() {
        let teachers = vec![Uuid::new_v4(), Uuid::new_v4()];
        let classes = generate_classes(5, &teachers, 2025);

        assert_eq!(classes.len(), 5);
        assert_eq!(classes[0].name, "6º Ano A");
        assert_eq!(classes[4].name, "7º Ano A");
        assert_eq!(classes[0].teacher_id, Some(teachers[0]));
        assert_eq!(classes[1].teacher_id, Some(teachers[1]));
        assert_eq!(classes[2].teacher_id, Some(teachers[0]));

        let untaught = generate_classes(2, &[], 2025);
        assert!(untaught.iter().all(|c| c.teacher_id.is_none()));
    }

    #[test]
    fn test_assign_students_groups() {
        let classes: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let students: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();

        let roster = assign_students(&classes, &students, 3);
        assert_eq!(roster[&classes[0]].len(), 3);
        assert_eq!(roster[&classes[1]].len(), 3);
        assert_eq!(roster[&classes[2]].len(), 1);
        assert!(assign_students(&classes, &students, 0).is_empty());
    }

    #[test]
    fn test_generated_submissions_respect_task_rules() {
        let now = Utc::now();
        let teacher = Uuid::new_v4();
        let class_id = Uuid::new_v4();
        let students: Vec<Uuid> = (0..30).map(|_| Uuid::new_v4()).collect();
        let roster = HashMap::from([(class_id, students)]);
        let tasks = vec![
            SeededTask {
                id: Uuid::new_v4(),
                class_id,
                created_by: Some(teacher),
                due_date: now - Duration::days(3),
                max_score: 10.0,
            },
            SeededTask {
                id: Uuid::new_v4(),
                class_id,
                created_by: Some(teacher),
                due_date: now + Duration::days(3),
                max_score: 10.0,
            },
        ];

        let submissions = generate_submissions(&tasks, &roster, 1.0, now);
        assert_eq!(submissions.len(), 60);

        for s in &submissions {
            let task = tasks.iter().find(|t| t.id == s.task_id).unwrap();
            assert!(s.submitted_at <= now);
            assert_eq!(s.late, s.submitted_at > task.due_date);
            if let Some(score) = s.score {
                assert!(task.due_date <= now);
                assert!((0.0..=task.max_score).contains(&score));
                assert_eq!(s.graded_by, Some(teacher));
            }
        }

        assert!(generate_submissions(&tasks, &roster, 0.0, now).is_empty());
    }
}
