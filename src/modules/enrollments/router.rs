use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    create_enrollment, delete_enrollment, get_enrollments, update_enrollment,
};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_enrollments).post(create_enrollment))
        .route("/{id}", patch(update_enrollment).delete(delete_enrollment))
}
