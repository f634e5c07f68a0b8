pub use educa_models::submissions::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, SUBMISSION_COLUMNS,
    Submission, SubmissionDetail, SubmissionFilterParams, UpdateSubmissionDto,
};
