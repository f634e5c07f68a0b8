use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use educa_auth::create_access_token;
use educa_config::JwtConfig;
use educa_core::{AppError, hash_password, verify_password};
use educa_models::Role;
use educa_models::users::User;

use crate::metrics;

use super::model::{ChangePasswordDto, LoginRequest, LoginResponse};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
    active: bool,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserWithPassword> for User {
    fn from(row: UserWithPassword) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let Some(row) = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, name, email, role, active, password, created_at, updated_at
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(dto.email.trim())
        .fetch_optional(db)
        .await?
        else {
            debug!("Login attempt for unknown email");
            metrics::record_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &row.password)? {
            warn!(user.id = %row.id, "Login attempt with wrong password");
            metrics::record_login_failure("wrong_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !row.active {
            warn!(user.id = %row.id, "Login attempt on inactive account");
            metrics::record_login_failure("inactive");
            return Err(AppError::forbidden("User account is inactive"));
        }

        let access_token = create_access_token(row.id, &row.email, row.role.as_str(), jwt_config)?;
        let user = User::from(row);

        metrics::record_login_success(user.role.as_str());
        info!(user.id = %user.id, user.role = %user.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current_hash =
            sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            warn!(user.id = %user_id, "Password change with wrong current password");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        if dto.current_password == dto.new_password {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "New password must be different from the current password"
            )));
        }

        let new_hash = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await?;

        info!(user.id = %user_id, "Password changed");

        Ok(())
    }
}
