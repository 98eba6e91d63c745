//! Admission period entity model and DTOs.

use admissions_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `admission_periods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdmissionPeriod {
    pub id: DbId,
    pub institute_id: DbId,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub total_applications: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new admission period with an already-decided status.
#[derive(Debug, Clone)]
pub struct CreateAdmissionPeriod {
    pub institute_id: DbId,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
}
