pub use educa_models::forum::{
    CreateMessageDto, CreateTopicDto, MESSAGE_COLUMNS, Message, MessageWithAuthor,
    PaginatedTopicsResponse, TOPIC_COLUMNS, Topic, TopicFilterParams, TopicSummary, TopicThread,
};
