//! # Educa Models
//!
//! Domain entities, request/response DTOs and validation schemas for the
//! Educa+ API.
//!
//! - [`roles`]: The [`Role`] enum (Papel) and route allow-lists
//! - [`auth`]: Login and password DTOs
//! - [`users`]: Users and guardian/student links
//! - [`classes`]: Classes (Turma)
//! - [`enrollments`]: Enrollments (Matrícula)
//! - [`tasks`]: Tasks (Tarefa)
//! - [`submissions`]: Submissions (Submissão)
//! - [`forum`]: Forum topics and messages
//! - [`achievements`]: Achievements awarded to students
//! - [`dashboard`]: Aggregated dashboard payloads

pub mod achievements;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod enrollments;
pub mod forum;
pub mod roles;
pub mod submissions;
pub mod tasks;
pub mod users;

pub use roles::Role;
