//! Authentication DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::User;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Successful login.
///
/// The same token is also set in the authentication cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "current_password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "new_password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_rejects_bad_email() {
        let dto = LoginRequest {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_login_request_requires_password() {
        let dto = LoginRequest {
            email: "ana@escola.br".to_string(),
            password: String::new(),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_change_password_min_length() {
        let dto = ChangePasswordDto {
            current_password: "old-password".to_string(),
            new_password: "short".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
