use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
};
use utoipa::{Modify, OpenApi};

use educa_core::{PaginationMeta, PaginationParams};
use educa_models::Role;

use crate::modules::achievements::model::{
    Achievement, CreateAchievementDto, PaginatedAchievementsResponse,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    ChangePasswordDto, LoginRequest, LoginResponse, MessageResponse,
};
use crate::modules::classes::model::{
    Class, ClassWithStats, CreateClassDto, PaginatedClassesResponse, RosterEntry, UpdateClassDto,
};
use crate::modules::dashboard::model::{
    GuardianDashboard, ManagerDashboard, PendingSubmission, RoleCount, StudentDashboard,
    StudentSummary, TeacherDashboard, UpcomingTask,
};
use crate::modules::enrollments::model::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetail, EnrollmentStatus,
    PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
use crate::modules::forum::model::{
    CreateMessageDto, CreateTopicDto, Message, MessageWithAuthor, PaginatedTopicsResponse, Topic,
    TopicSummary, TopicThread,
};
use crate::modules::health::controller::HealthResponse;
use crate::modules::submissions::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, Submission,
    SubmissionDetail, UpdateSubmissionDto,
};
use crate::modules::tasks::model::{CreateTaskDto, PaginatedTasksResponse, Task, UpdateTaskDto};
use crate::modules::users::model::{
    CreateUserDto, LinkStudentDto, LinkedStudent, PaginatedUsersResponse, UpdateUserDto, User,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health_check,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::change_password,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::link_student,
        crate::modules::users::controller::get_linked_students,
        crate::modules::users::controller::unlink_student,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::get_class_students,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::get_enrollments,
        crate::modules::enrollments::controller::update_enrollment,
        crate::modules::enrollments::controller::delete_enrollment,
        crate::modules::tasks::controller::create_task,
        crate::modules::tasks::controller::get_tasks,
        crate::modules::tasks::controller::get_task,
        crate::modules::tasks::controller::update_task,
        crate::modules::tasks::controller::delete_task,
        crate::modules::tasks::controller::get_task_submissions,
        crate::modules::submissions::controller::create_submission,
        crate::modules::submissions::controller::get_submissions,
        crate::modules::submissions::controller::get_submission,
        crate::modules::submissions::controller::update_submission,
        crate::modules::submissions::controller::grade_submission,
        crate::modules::forum::controller::get_topics,
        crate::modules::forum::controller::create_topic,
        crate::modules::forum::controller::get_topic,
        crate::modules::forum::controller::delete_topic,
        crate::modules::forum::controller::post_message,
        crate::modules::forum::controller::delete_message,
        crate::modules::achievements::controller::create_achievement,
        crate::modules::achievements::controller::get_achievements,
        crate::modules::achievements::controller::delete_achievement,
        crate::modules::dashboard::controller::student_dashboard,
        crate::modules::dashboard::controller::teacher_dashboard,
        crate::modules::dashboard::controller::manager_dashboard,
        crate::modules::dashboard::controller::guardian_dashboard,
        crate::modules::dashboard::controller::guardian_student_dashboard,
    ),
    components(
        schemas(
            Role,
            ErrorResponse,
            HealthResponse,
            PaginationMeta,
            PaginationParams,
            LoginRequest,
            LoginResponse,
            ChangePasswordDto,
            MessageResponse,
            User,
            CreateUserDto,
            UpdateUserDto,
            PaginatedUsersResponse,
            LinkStudentDto,
            LinkedStudent,
            Class,
            ClassWithStats,
            CreateClassDto,
            UpdateClassDto,
            PaginatedClassesResponse,
            RosterEntry,
            Enrollment,
            EnrollmentDetail,
            EnrollmentStatus,
            CreateEnrollmentDto,
            UpdateEnrollmentDto,
            PaginatedEnrollmentsResponse,
            Task,
            CreateTaskDto,
            UpdateTaskDto,
            PaginatedTasksResponse,
            Submission,
            SubmissionDetail,
            CreateSubmissionDto,
            UpdateSubmissionDto,
            GradeSubmissionDto,
            PaginatedSubmissionsResponse,
            Topic,
            TopicSummary,
            TopicThread,
            Message,
            MessageWithAuthor,
            CreateTopicDto,
            CreateMessageDto,
            PaginatedTopicsResponse,
            Achievement,
            CreateAchievementDto,
            PaginatedAchievementsResponse,
            StudentSummary,
            UpcomingTask,
            StudentDashboard,
            PendingSubmission,
            TeacherDashboard,
            RoleCount,
            ManagerDashboard,
            GuardianDashboard,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Authentication", description = "Login, logout and password management"),
        (name = "Users", description = "User accounts and guardian links (staff)"),
        (name = "Classes", description = "Classes (turmas) and rosters"),
        (name = "Enrollments", description = "Student enrollments (matrículas)"),
        (name = "Tasks", description = "Class tasks (tarefas)"),
        (name = "Submissions", description = "Task submissions and grading"),
        (name = "Forum", description = "Class forum topics and messages"),
        (name = "Achievements", description = "Achievements awarded to students"),
        (name = "Dashboard", description = "Role dashboards")
    ),
    info(
        title = "Educa+ API",
        version = "0.1.0",
        description = "School management REST API with role-based access for administrators, managers, teachers, students and guardians.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}
