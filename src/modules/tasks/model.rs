pub use educa_models::tasks::{
    CreateTaskDto, DEFAULT_MAX_SCORE, PaginatedTasksResponse, TASK_COLUMNS, Task,
    TaskFilterParams, UpdateTaskDto,
};
