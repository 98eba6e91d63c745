//! Per-institute application quota tracker row.

use admissions_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `student_institute_applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationTracker {
    pub id: DbId,
    pub student_id: DbId,
    pub institute_id: DbId,
    pub academic_year: i32,
    pub application_count: i32,
    pub course_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
