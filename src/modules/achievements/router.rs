use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{create_achievement, delete_achievement, get_achievements};

pub fn init_achievements_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_achievements).post(create_achievement))
        .route("/{id}", delete(delete_achievement))
}
