pub use educa_models::achievements::{
    ACHIEVEMENT_COLUMNS, Achievement, AchievementFilterParams, CreateAchievementDto,
    PaginatedAchievementsResponse,
};
