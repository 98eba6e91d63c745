//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Plain
//! reads accept `&PgPool`; anything that participates in a lifecycle
//! transaction accepts `&mut PgConnection` so callers pass `&mut *tx`.

pub mod admission_period_repo;
pub mod application_repo;
pub mod course_repo;
pub mod profile_repo;
pub mod stats_repo;
pub mod tracker_repo;
pub mod user_repo;

pub use admission_period_repo::AdmissionPeriodRepo;
pub use application_repo::ApplicationRepo;
pub use course_repo::CourseRepo;
pub use profile_repo::{InstituteRepo, StudentRepo};
pub use stats_repo::StatsRepo;
pub use tracker_repo::TrackerRepo;
pub use user_repo::UserRepo;
