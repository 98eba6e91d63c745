//! Well-known role name constants.
//!
//! These must match the `user_type` check constraint in
//! `20261001000001_create_reference_tables.sql`.

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_INSTITUTE: &str = "institute";
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_INSTITUTE, ROLE_ADMIN];
