//! # Educa+ API
//!
//! REST backend for the Educa+ school platform, built with Axum and
//! PostgreSQL. Administrators, managers (gestores), teachers, students and
//! guardians (responsáveis) share one API; what each of them may call and see
//! is decided by their role and by their relation to a class or a student.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── educa-core/       # AppError, pagination, password hashing, serde helpers
//! ├── educa-config/     # Environment configuration (JWT, cookie, CORS, rate limit)
//! ├── educa-db/         # Pool, migrations, ping
//! ├── educa-auth/       # JWT claims
//! ├── educa-models/     # Entities and DTOs
//! └── educa-cli/        # Admin creation, seeding, integrity checks, keep-alive
//! src/
//! ├── middleware/       # Auth extractors, role layers, login rate limiting
//! ├── modules/          # Feature modules
//! │   ├── auth/         # Login, logout, profile, password change
//! │   ├── users/        # User management and guardian links
//! │   ├── classes/      # Classes and rosters
//! │   ├── enrollments/  # Enrollments
//! │   ├── tasks/        # Tasks
//! │   ├── submissions/  # Submissions and grading
//! │   ├── forum/        # Class forums
//! │   ├── achievements/ # Achievements
//! │   ├── dashboard/    # Role dashboards
//! │   └── health/       # Liveness probe
//! └── utils/            # Row-level access helpers
//! ```
//!
//! ## Authentication
//!
//! `POST /api/auth/login` returns a JWT and also sets it in an HTTP-only
//! cookie. Every other endpoint accepts either the cookie or an
//! `Authorization: Bearer` header.
//!
//! ## Access rules
//!
//! | Role | Sees |
//! |------|------|
//! | ADMINISTRADOR, GESTOR | Everything |
//! | PROFESSOR | The classes they teach and everything inside them |
//! | ALUNO | The classes they are actively enrolled in, their own records |
//! | RESPONSAVEL | Read-only view of their linked students |
//!
//! Resources outside the caller's view are reported as `404`; visible
//! resources the caller may not change are reported as `403`.
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use educa_auth;
pub use educa_config;
pub use educa_core;
pub use educa_db;
pub use educa_models;
