//! Middleware and extractors for cross-cutting request concerns.
//!
//! - [`auth`]: token extraction (`AuthUser`, `CurrentUser`)
//! - [`role`]: role allow-list layers and helpers
//! - [`rate_limit`]: per-IP login throttling
//!
//! # Authentication Flow
//!
//! 1. Client sends the `token` cookie set at login, or `Authorization: Bearer <token>`
//! 2. `AuthUser` validates the JWT and exposes its claims
//! 3. Role layers reject callers outside the route's allow-list with 403
//! 4. Services apply ownership rules (own class, own submission, linked student)

pub mod auth;
pub mod rate_limit;
pub mod role;
