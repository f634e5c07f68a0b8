use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_linked_students, get_user, get_users, link_student,
    unlink_student, update_user,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route(
            "/{id}/students",
            get(get_linked_students).post(link_student),
        )
        .route(
            "/{id}/students/{student_id}",
            delete(unlink_student),
        )
}
