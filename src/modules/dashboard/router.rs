use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    guardian_dashboard, guardian_student_dashboard, manager_dashboard, student_dashboard,
    teacher_dashboard,
};

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/student", get(student_dashboard))
        .route("/teacher", get(teacher_dashboard))
        .route("/manager", get(manager_dashboard))
        .route("/guardian", get(guardian_dashboard))
        .route("/guardian/{student_id}", get(guardian_student_dashboard))
}
