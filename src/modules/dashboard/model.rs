pub use educa_models::dashboard::{
    GuardianDashboard, ManagerDashboard, PendingSubmission, RoleCount, StudentDashboard,
    StudentSummary, TeacherDashboard, UpcomingTask,
};
