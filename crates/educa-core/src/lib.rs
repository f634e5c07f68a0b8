//! # Educa Core
//!
//! Core types, errors, and utilities for the Educa+ API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination utilities for list endpoints
//! - [`password`]: bcrypt password hashing and verification
//! - [`serde`]: Custom deserialization helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use educa_core::{AppError, PaginationParams};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Class not found"));
//! let params = PaginationParams::default();
//! assert_eq!(params.limit(), 10);
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
