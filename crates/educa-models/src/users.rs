//! User models and DTOs.
//!
//! - [`User`]: A user row (the password hash is never part of this struct)
//! - [`CreateUserDto`] / [`UpdateUserDto`]: Administrator-only user management
//! - [`LinkStudentDto`]: Links a guardian (`RESPONSAVEL`) to a student (`ALUNO`)

use chrono::{DateTime, Utc};
use educa_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`User`], for `SELECT`/`RETURNING` clauses.
pub const USER_COLUMNS: &str = "id, name, email, role, active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 120, message = "name must be between 1 and 120 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 120, message = "name must be between 1 and 120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub role: Option<Role>,
    /// Case-insensitive partial match on name or email
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LinkStudentDto {
    pub student_id: Uuid,
}

/// A student linked to a guardian.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LinkedStudent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub linked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_validation() {
        let dto = CreateUserDto {
            name: "Ana Souza".to_string(),
            email: "ana@escola.br".to_string(),
            password: "password123".to_string(),
            role: Role::Student,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateUserDto {
            name: String::new(),
            email: "ana".to_string(),
            password: "short".to_string(),
            role: Role::Student,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_user_empty_is_valid() {
        assert!(UpdateUserDto::default().validate().is_ok());
    }

    #[test]
    fn test_create_user_deserializes_role() {
        let dto: CreateUserDto = serde_json::from_str(
            r#"{"name":"Rui","email":"rui@escola.br","password":"password123","role":"RESPONSAVEL"}"#,
        )
        .unwrap();
        assert_eq!(dto.role, Role::Guardian);
    }

    #[test]
    fn test_user_serialization_has_no_password() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@escola.br".to_string(),
            role: Role::Student,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "ALUNO");
    }
}
