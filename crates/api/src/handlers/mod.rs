pub mod admin;
pub mod admission;
pub mod applications;
pub mod auth;
