pub mod admission_period;
pub mod application;
pub mod error;
pub mod quota;
pub mod roles;
pub mod types;
