//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the lifecycle creates rows
//! - Joined read views used by the listing endpoints

pub mod admission_period;
pub mod application;
pub mod course;
pub mod stats;
pub mod tracker;
pub mod user;
