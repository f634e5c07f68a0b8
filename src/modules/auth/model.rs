pub use educa_models::auth::{ChangePasswordDto, LoginRequest, LoginResponse, MessageResponse};
