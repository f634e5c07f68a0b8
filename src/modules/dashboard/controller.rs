use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use educa_core::AppError;
use educa_models::Role;
use educa_models::roles::STAFF;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{check_any_role, check_role};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::{GuardianDashboard, ManagerDashboard, StudentDashboard, TeacherDashboard};
use super::service::DashboardService;

/// Dashboard of the authenticated student
#[utoipa::path(
    get,
    path = "/api/dashboard/student",
    responses(
        (status = 200, description = "Student dashboard", body = StudentDashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn student_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StudentDashboard>, AppError> {
    check_role(&auth_user, Role::Student)?;

    let dashboard = DashboardService::student_dashboard(&state.db, auth_user.user_id()?).await?;
    Ok(Json(dashboard))
}

/// Dashboard of the authenticated teacher
#[utoipa::path(
    get,
    path = "/api/dashboard/teacher",
    responses(
        (status = 200, description = "Teacher dashboard", body = TeacherDashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn teacher_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<TeacherDashboard>, AppError> {
    check_role(&auth_user, Role::Teacher)?;

    let dashboard = DashboardService::teacher_dashboard(&state.db, auth_user.user_id()?).await?;
    Ok(Json(dashboard))
}

/// School-wide figures (staff only)
#[utoipa::path(
    get,
    path = "/api/dashboard/manager",
    responses(
        (status = 200, description = "Manager dashboard", body = ManagerDashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn manager_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ManagerDashboard>, AppError> {
    check_any_role(&auth_user, STAFF)?;

    let dashboard = DashboardService::manager_dashboard(&state.db).await?;
    Ok(Json(dashboard))
}

/// Summary figures for each student linked to the authenticated guardian
#[utoipa::path(
    get,
    path = "/api/dashboard/guardian",
    responses(
        (status = 200, description = "Guardian dashboard", body = GuardianDashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - guardians only", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn guardian_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<GuardianDashboard>, AppError> {
    check_role(&auth_user, Role::Guardian)?;

    let dashboard = DashboardService::guardian_dashboard(&state.db, auth_user.user_id()?).await?;
    Ok(Json(dashboard))
}

/// Full dashboard of one student, for a linked guardian or staff
#[utoipa::path(
    get,
    path = "/api/dashboard/guardian/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student dashboard", body = StudentDashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not linked to the student", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn guardian_student_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StudentDashboard>, AppError> {
    check_any_role(
        &auth_user,
        &[Role::Guardian, Role::Administrator, Role::Manager],
    )?;

    let dashboard =
        DashboardService::guardian_student_dashboard(&state.db, &auth_user.actor()?, student_id)
            .await?;
    Ok(Json(dashboard))
}
