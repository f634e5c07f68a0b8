use axum::{Router, middleware, routing::get};

use crate::middleware::role::require_teaching;
use crate::state::AppState;

use super::controller::{
    create_task, delete_task, get_task, get_task_submissions, get_tasks, update_task,
};

pub fn init_tasks_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/{id}", get(get_task).patch(update_task).delete(delete_task))
        .route(
            "/{id}/submissions",
            get(get_task_submissions)
                .route_layer(middleware::from_fn_with_state(state, require_teaching)),
        )
}
