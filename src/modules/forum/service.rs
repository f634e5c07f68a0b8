use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use educa_core::{AppError, PaginationMeta};
use educa_models::classes::Class;

use crate::middleware::auth::Actor;
use crate::utils::access::{
    can_manage_class, fetch_class, fetch_visible_class, is_class_member, push_class_visibility,
};

use super::model::{
    CreateMessageDto, CreateTopicDto, MESSAGE_COLUMNS, Message, MessageWithAuthor,
    PaginatedTopicsResponse, TOPIC_COLUMNS, Topic, TopicFilterParams, TopicSummary, TopicThread,
};

const TOPIC_SUMMARY_SELECT: &str = "SELECT t.id, t.class_id, t.author_id, u.name AS author_name, t.title,
        (SELECT COUNT(*) FROM forum_messages m WHERE m.topic_id = t.id) AS message_count,
        COALESCE((SELECT MAX(m.created_at) FROM forum_messages m WHERE m.topic_id = t.id), t.created_at)
            AS last_activity_at,
        t.created_at
     FROM forum_topics t
     JOIN users u ON u.id = t.author_id
     WHERE ";

/// Authors, the class teacher and staff may remove a post.
fn can_moderate(actor: &Actor, author_id: Uuid, class: &Class) -> bool {
    author_id == actor.id || can_manage_class(actor, class)
}

fn ensure_can_moderate(actor: &Actor, author_id: Uuid, class: &Class) -> Result<(), AppError> {
    if can_moderate(actor, author_id, class) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Only the author, the class teacher or school staff can delete this post",
        ))
    }
}

/// A reply must stay inside the topic it is posted to.
fn check_parent_topic(parent_topic_id: Option<Uuid>, topic_id: Uuid) -> Result<(), AppError> {
    match parent_topic_id {
        Some(parent_topic) if parent_topic == topic_id => Ok(()),
        _ => Err(AppError::bad_request(anyhow::anyhow!(
            "parent_id must reference a message of the same topic"
        ))),
    }
}

async fn ensure_class_member(db: &PgPool, actor: &Actor, class: &Class) -> Result<(), AppError> {
    if is_class_member(db, actor, class).await? {
        return Ok(());
    }
    warn!(class.id = %class.id, user.role = %actor.role, "Forum post from outside the class");
    Err(AppError::forbidden(
        "Only members of the class can post in its forum",
    ))
}

async fn fetch_topic(db: &PgPool, topic_id: Uuid) -> Result<Topic, AppError> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM forum_topics WHERE id = $1"
    ))
    .bind(topic_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Topic not found")))
}

async fn fetch_visible_topic(db: &PgPool, actor: &Actor, topic_id: Uuid) -> Result<Topic, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {TOPIC_COLUMNS} FROM forum_topics t WHERE t.id = "
    ));
    qb.push_bind(topic_id).push(" AND ");
    push_class_visibility(&mut qb, actor, "t.class_id");

    qb.build_query_as::<Topic>()
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Topic not found")))
}

pub struct ForumService;

impl ForumService {
    #[instrument(skip(db, filters), fields(user.id = %actor.id, user.role = %actor.role, db.operation = "SELECT", db.table = "forum_topics"))]
    pub async fn get_topics(
        db: &PgPool,
        actor: &Actor,
        filters: TopicFilterParams,
    ) -> Result<PaginatedTopicsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM forum_topics t WHERE ");
        push_class_visibility(&mut count_qb, actor, "t.class_id");
        if let Some(class_id) = filters.class_id {
            count_qb.push(" AND t.class_id = ").push_bind(class_id);
        }
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut data_qb = QueryBuilder::<Postgres>::new(TOPIC_SUMMARY_SELECT);
        push_class_visibility(&mut data_qb, actor, "t.class_id");
        if let Some(class_id) = filters.class_id {
            data_qb.push(" AND t.class_id = ").push_bind(class_id);
        }
        data_qb
            .push(" ORDER BY t.created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let topics = data_qb
            .build_query_as::<TopicSummary>()
            .fetch_all(db)
            .await?;

        debug!(total, returned = topics.len(), "Topics fetched");

        Ok(PaginatedTopicsResponse {
            data: topics,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(user.id = %actor.id, class.id = %dto.class_id, db.operation = "INSERT", db.table = "forum_topics"))]
    pub async fn create_topic(
        db: &PgPool,
        actor: &Actor,
        dto: CreateTopicDto,
    ) -> Result<Topic, AppError> {
        let class = fetch_visible_class(db, actor, dto.class_id).await?;
        ensure_class_member(db, actor, &class).await?;

        let topic = sqlx::query_as::<_, Topic>(&format!(
            "INSERT INTO forum_topics (class_id, author_id, title, body)
             VALUES ($1, $2, $3, $4)
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(class.id)
        .bind(actor.id)
        .bind(dto.title.trim())
        .bind(&dto.body)
        .fetch_one(db)
        .await?;

        info!(topic.id = %topic.id, "Topic created");

        Ok(topic)
    }

    /// Loads a topic with its messages, oldest first.
    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "SELECT", db.table = "forum_topics"))]
    pub async fn get_topic(
        db: &PgPool,
        actor: &Actor,
        topic_id: Uuid,
    ) -> Result<TopicThread, AppError> {
        let topic = fetch_visible_topic(db, actor, topic_id).await?;

        let author_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
            .bind(topic.author_id)
            .fetch_one(db)
            .await?;

        let messages = sqlx::query_as::<_, MessageWithAuthor>(
            "SELECT m.id, m.topic_id, m.author_id, u.name AS author_name, m.parent_id,
                    m.content, m.created_at
             FROM forum_messages m
             JOIN users u ON u.id = m.author_id
             WHERE m.topic_id = $1
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(topic.id)
        .fetch_all(db)
        .await?;

        debug!(messages = messages.len(), "Topic thread loaded");

        Ok(TopicThread {
            topic,
            author_name,
            messages,
        })
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "DELETE", db.table = "forum_topics"))]
    pub async fn delete_topic(db: &PgPool, actor: &Actor, topic_id: Uuid) -> Result<(), AppError> {
        let topic = fetch_topic(db, topic_id).await?;
        let class = fetch_class(db, topic.class_id).await?;
        ensure_can_moderate(actor, topic.author_id, &class)?;

        sqlx::query("DELETE FROM forum_topics WHERE id = $1")
            .bind(topic.id)
            .execute(db)
            .await?;

        info!(topic.id = %topic.id, "Topic deleted");

        Ok(())
    }

    /// Posts a message, optionally replying to another message of the topic.
    #[instrument(skip(db, dto), fields(user.id = %actor.id, topic.id = %topic_id, db.operation = "INSERT", db.table = "forum_messages"))]
    pub async fn post_message(
        db: &PgPool,
        actor: &Actor,
        topic_id: Uuid,
        dto: CreateMessageDto,
    ) -> Result<Message, AppError> {
        let topic = fetch_visible_topic(db, actor, topic_id).await?;
        let class = fetch_class(db, topic.class_id).await?;
        ensure_class_member(db, actor, &class).await?;

        if let Some(parent_id) = dto.parent_id {
            let parent_topic =
                sqlx::query_scalar::<_, Uuid>("SELECT topic_id FROM forum_messages WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(db)
                    .await?;
            check_parent_topic(parent_topic, topic.id)?;
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO forum_messages (topic_id, author_id, parent_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(topic.id)
        .bind(actor.id)
        .bind(dto.parent_id)
        .bind(&dto.content)
        .fetch_one(db)
        .await?;

        sqlx::query("UPDATE forum_topics SET updated_at = NOW() WHERE id = $1")
            .bind(topic.id)
            .execute(db)
            .await?;

        info!(message.id = %message.id, "Message posted");

        Ok(message)
    }

    #[instrument(skip(db), fields(user.id = %actor.id, db.operation = "DELETE", db.table = "forum_messages"))]
    pub async fn delete_message(
        db: &PgPool,
        actor: &Actor,
        message_id: Uuid,
    ) -> Result<(), AppError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM forum_messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Message not found")))?;

        let topic = fetch_topic(db, message.topic_id).await?;
        let class = fetch_class(db, topic.class_id).await?;
        ensure_can_moderate(actor, message.author_id, &class)?;

        // Replies go with their parent (ON DELETE CASCADE).
        sqlx::query("DELETE FROM forum_messages WHERE id = $1")
            .bind(message.id)
            .execute(db)
            .await?;

        info!(message.id = %message.id, "Message deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use educa_models::Role;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    fn class_taught_by(teacher_id: Uuid) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: "8º Ano B".to_string(),
            description: None,
            year: 2025,
            teacher_id: Some(teacher_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_author_can_delete_own_post() {
        let student = actor(Role::Student);
        let class = class_taught_by(Uuid::new_v4());
        assert!(can_moderate(&student, student.id, &class));
        assert!(!can_moderate(&student, Uuid::new_v4(), &class));
    }

    #[test]
    fn test_class_teacher_and_staff_moderate() {
        let teacher = actor(Role::Teacher);
        let class = class_taught_by(teacher.id);
        let author = Uuid::new_v4();

        assert!(can_moderate(&teacher, author, &class));
        assert!(can_moderate(&actor(Role::Manager), author, &class));
        assert!(!can_moderate(&actor(Role::Teacher), author, &class));
        assert!(ensure_can_moderate(&actor(Role::Guardian), author, &class).is_err());
    }

    #[test]
    fn test_parent_must_belong_to_topic() {
        let topic_id = Uuid::new_v4();
        assert!(check_parent_topic(Some(topic_id), topic_id).is_ok());

        let err = check_parent_topic(Some(Uuid::new_v4()), topic_id).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        assert!(check_parent_topic(None, topic_id).is_err());
    }
}
