//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token
//!   (or, when enabled, a trusted `X-User-Id` header).
//! - [`rbac::RequireStudent`] -- Requires a student with a student profile.
//! - [`rbac::RequireInstitute`] -- Requires an institute user with an institute profile.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
