//! # Educa Auth
//!
//! JWT claims and token utilities for the Educa+ API.
//!
//! Access tokens are HS256 JWTs carrying the user id, email and role
//! ([`Claims`]). They are issued at login, stored by browsers in an HTTP-only
//! cookie and verified on every authenticated request.
//!
//! ```ignore
//! use educa_auth::{create_access_token, verify_token};
//! use educa_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "ana@escola.br", "ALUNO", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, "ALUNO");
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
