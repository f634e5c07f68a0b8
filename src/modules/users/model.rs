pub use educa_models::users::{
    CreateUserDto, LinkStudentDto, LinkedStudent, PaginatedUsersResponse, USER_COLUMNS,
    UpdateUserDto, User, UserFilterParams,
};
