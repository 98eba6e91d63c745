//! Read-only course projection used at submission time.

use admissions_core::types::{Date, DbId};
use serde::Serialize;
use sqlx::FromRow;

/// A course joined with its owning institute via its faculty.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseForApplication {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub application_deadline: Option<Date>,
    pub is_active: bool,
    pub institute_id: DbId,
    pub institute_name: String,
}

/// DTO for inserting a course (seeding and tests).
#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub faculty_id: DbId,
    pub name: String,
    pub code: String,
    pub application_deadline: Option<Date>,
    pub is_active: bool,
}
