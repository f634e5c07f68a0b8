pub use educa_models::classes::{
    CLASS_COLUMNS, Class, ClassFilterParams, ClassWithStats, CreateClassDto,
    PaginatedClassesResponse, RosterEntry, UpdateClassDto,
};
