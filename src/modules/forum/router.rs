use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    create_topic, delete_message, delete_topic, get_topic, get_topics, post_message,
};

pub fn init_forum_router() -> Router<AppState> {
    Router::new()
        .route("/topics", get(get_topics).post(create_topic))
        .route("/topics/{id}", get(get_topic).delete(delete_topic))
        .route("/topics/{id}/messages", post(post_message))
        .route("/messages/{id}", delete(delete_message))
}
