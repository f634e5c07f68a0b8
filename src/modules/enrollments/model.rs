pub use educa_models::enrollments::{
    CreateEnrollmentDto, ENROLLMENT_COLUMNS, Enrollment, EnrollmentDetail, EnrollmentFilterParams,
    EnrollmentStatus, PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
