//! Application entity model and DTOs.

use admissions_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub institute_id: DbId,
    pub admission_period_id: Option<DbId>,
    pub preferred_major: Option<String>,
    pub personal_statement: String,
    pub status: String,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub documents: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new application. Status always starts as `pending`.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub student_id: DbId,
    pub course_id: DbId,
    pub institute_id: DbId,
    pub admission_period_id: DbId,
    pub preferred_major: Option<String>,
    pub personal_statement: String,
    pub documents: Vec<String>,
}

/// An accepted application held at some institute.
#[derive(Debug, Clone, FromRow)]
pub struct AcceptedPlacement {
    pub application_id: DbId,
    pub institute_id: DbId,
    pub institute_name: String,
}

/// A student's application joined with course, institute and period names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentApplicationView {
    pub id: DbId,
    pub status: String,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub preferred_major: Option<String>,
    pub course_id: DbId,
    pub course_name: String,
    pub course_code: String,
    pub institute_id: DbId,
    pub institute_name: String,
    pub institute_location: Option<String>,
    pub admission_period: Option<String>,
    pub admission_status: Option<String>,
}

/// An application as seen by the reviewing institute.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InstituteApplicationView {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub admission_period_id: Option<DbId>,
    pub preferred_major: Option<String>,
    pub personal_statement: String,
    pub status: String,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub documents: Vec<String>,
    pub course_name: String,
    pub course_code: String,
    pub student_name: String,
    pub student_email: String,
}

/// Filters for listing an institute's applications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstituteApplicationFilter {
    pub status: Option<String>,
    pub course_id: Option<DbId>,
}

/// Cross-institute application row for the admin listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminApplicationView {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub institute_id: DbId,
    pub admission_period_id: Option<DbId>,
    pub status: String,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub student_name: String,
    pub student_email: String,
    pub course_name: String,
    pub institute_name: String,
    pub admission_period: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminApplicationFilter {
    pub status: Option<String>,
    pub institute_id: Option<DbId>,
}
