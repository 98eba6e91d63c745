//! System-wide aggregate counts for the admin overview.

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemStats {
    pub total_students: i64,
    pub total_institutes: i64,
    pub total_applications: i64,
    pub active_admissions: i64,
    pub pending_applications: i64,
    pub accepted_applications: i64,
    pub active_courses: i64,
}
