//! Forum models: topics opened in a class and the messages replying to them.
//!
//! Messages may reply to another message of the same topic through
//! `parent_id`, forming a simple thread.

use chrono::{DateTime, Utc};
use educa_core::serde::deserialize_optional_uuid;
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Topic {
    pub id: Uuid,
    pub class_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TOPIC_COLUMNS: &str = "id, class_id, author_id, title, body, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TopicSummary {
    pub id: Uuid,
    pub class_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub message_count: i64,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub const MESSAGE_COLUMNS: &str = "id, topic_id, author_id, parent_id, content, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MessageWithAuthor {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A topic with its messages, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopicThread {
    pub topic: Topic,
    pub author_name: String,
    pub messages: Vec<MessageWithAuthor>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTopicDto {
    pub class_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "body must be between 1 and 5000 characters"))]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMessageDto {
    #[validate(length(min = 1, max = 5000, message = "content must be between 1 and 5000 characters"))]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TopicFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedTopicsResponse {
    pub data: Vec<TopicSummary>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_validation() {
        let dto = CreateTopicDto {
            class_id: Uuid::new_v4(),
            title: "Dúvida sobre a prova".to_string(),
            body: "Quais capítulos caem?".to_string(),
        };
        assert!(dto.validate().is_ok());

        let dto = CreateTopicDto {
            class_id: Uuid::new_v4(),
            title: String::new(),
            body: "x".repeat(5001),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("body"));
    }

    #[test]
    fn test_message_requires_content() {
        let dto = CreateMessageDto {
            content: String::new(),
            parent_id: None,
        };
        assert!(dto.validate().is_err());
    }
}
