//! Feature modules.
//!
//! Each module follows the same layout: `model.rs` re-exports the entities
//! and DTOs from `educa_models`, `service.rs` holds the queries and business
//! rules, `controller.rs` the HTTP handlers and `router.rs` the routes.

pub mod achievements;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod enrollments;
pub mod forum;
pub mod health;
pub mod submissions;
pub mod tasks;
pub mod users;
