use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{
    create_submission, get_submission, get_submissions, grade_submission, update_submission,
};

pub fn init_submissions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_submissions).post(create_submission))
        .route("/{id}", get(get_submission).patch(update_submission))
        .route("/{id}/grade", put(grade_submission))
}
