//! Quota tracker: at most two courses per (student, institute, academic year).
//!
//! The pure set arithmetic lives in [`admissions_core::quota`]; this module
//! loads and persists the tracker row around it.

use admissions_core::quota::{self, academic_year, QuotaStatus};
use admissions_core::types::{Date, DbId};
use admissions_db::models::tracker::ApplicationTracker;
use admissions_db::repositories::TrackerRepo;
use sqlx::{PgConnection, PgPool};

use crate::error::AppResult;

pub struct QuotaTracker;

impl QuotaTracker {
    /// Read-only quota check for the academic year containing `today`.
    pub async fn can_apply(
        pool: &PgPool,
        student_id: DbId,
        institute_id: DbId,
        today: Date,
    ) -> Result<QuotaStatus, sqlx::Error> {
        let tracker =
            TrackerRepo::find(pool, student_id, institute_id, academic_year(today)).await?;
        Ok(tracker.map_or_else(QuotaStatus::fresh, |t| QuotaStatus::from_courses(t.course_ids)))
    }

    /// Lock (seeding if needed) the tracker row for the rest of the
    /// transaction.
    pub async fn lock(
        conn: &mut PgConnection,
        student_id: DbId,
        institute_id: DbId,
        academic_year: i32,
    ) -> Result<LockedQuota, sqlx::Error> {
        let tracker =
            TrackerRepo::lock_or_seed(conn, student_id, institute_id, academic_year).await?;
        Ok(LockedQuota { tracker })
    }

    /// Remove `course_id` from the tracker of the given year.
    ///
    /// Returns `false` when there was nothing to release (no row, or the
    /// course was not tracked); the count never goes below zero.
    pub async fn release(
        conn: &mut PgConnection,
        student_id: DbId,
        institute_id: DbId,
        academic_year: i32,
        course_id: DbId,
    ) -> AppResult<bool> {
        let Some(tracker) =
            TrackerRepo::lock_existing(conn, student_id, institute_id, academic_year).await?
        else {
            return Ok(false);
        };
        let Some(next) = quota::release(&tracker.course_ids, course_id) else {
            return Ok(false);
        };
        TrackerRepo::save_courses(conn, tracker.id, &next).await?;
        Ok(true)
    }
}

/// A tracker row locked by the current transaction.
pub struct LockedQuota {
    tracker: ApplicationTracker,
}

impl LockedQuota {
    pub fn status(&self) -> QuotaStatus {
        QuotaStatus::from_courses(self.tracker.course_ids.clone())
    }

    /// Record `course_id`; a course already tracked is left as is.
    pub async fn track(
        self,
        conn: &mut PgConnection,
        course_id: DbId,
    ) -> AppResult<ApplicationTracker> {
        match quota::track(&self.tracker.course_ids, course_id)? {
            None => Ok(self.tracker),
            Some(next) => Ok(TrackerRepo::save_courses(conn, self.tracker.id, &next).await?),
        }
    }
}
