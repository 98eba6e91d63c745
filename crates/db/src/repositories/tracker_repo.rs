//! Repository for the `student_institute_applications` quota tracker.
//!
//! Reads for display go through the pool; every mutation takes a
//! `&mut PgConnection` so it runs inside the caller's transaction, after
//! the row has been locked with [`TrackerRepo::lock_or_seed`] or
//! [`TrackerRepo::lock_existing`].

use admissions_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tracker::ApplicationTracker;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, institute_id, academic_year, application_count, \
    course_ids, created_at, updated_at";

pub struct TrackerRepo;

impl TrackerRepo {
    /// Find the tracker row for (student, institute, year), if any.
    pub async fn find(
        pool: &PgPool,
        student_id: DbId,
        institute_id: DbId,
        academic_year: i32,
    ) -> Result<Option<ApplicationTracker>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM student_institute_applications \
             WHERE student_id = $1 AND institute_id = $2 AND academic_year = $3"
        );
        sqlx::query_as::<_, ApplicationTracker>(&query)
            .bind(student_id)
            .bind(institute_id)
            .bind(academic_year)
            .fetch_optional(pool)
            .await
    }

    /// Lock the tracker row for (student, institute, year), creating an empty
    /// one first if none exists.
    ///
    /// Seeding before locking gives concurrent submissions a row to queue on,
    /// so the quota check and the increment cannot interleave. An empty seed
    /// left by a failed submission disappears with the rollback.
    pub async fn lock_or_seed(
        conn: &mut PgConnection,
        student_id: DbId,
        institute_id: DbId,
        academic_year: i32,
    ) -> Result<ApplicationTracker, sqlx::Error> {
        sqlx::query(
            "INSERT INTO student_institute_applications \
                (student_id, institute_id, academic_year, application_count, course_ids) \
             VALUES ($1, $2, $3, 0, '{}') \
             ON CONFLICT ON CONSTRAINT uq_student_institute_year DO NOTHING",
        )
        .bind(student_id)
        .bind(institute_id)
        .bind(academic_year)
        .execute(&mut *conn)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM student_institute_applications \
             WHERE student_id = $1 AND institute_id = $2 AND academic_year = $3 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, ApplicationTracker>(&query)
            .bind(student_id)
            .bind(institute_id)
            .bind(academic_year)
            .fetch_one(&mut *conn)
            .await
    }

    /// Lock an existing tracker row without creating one.
    pub async fn lock_existing(
        conn: &mut PgConnection,
        student_id: DbId,
        institute_id: DbId,
        academic_year: i32,
    ) -> Result<Option<ApplicationTracker>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM student_institute_applications \
             WHERE student_id = $1 AND institute_id = $2 AND academic_year = $3 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, ApplicationTracker>(&query)
            .bind(student_id)
            .bind(institute_id)
            .bind(academic_year)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Replace the course set of a locked row. The count is derived from the
    /// set in the same statement so the two can never disagree.
    pub async fn save_courses(
        conn: &mut PgConnection,
        tracker_id: DbId,
        course_ids: &[DbId],
    ) -> Result<ApplicationTracker, sqlx::Error> {
        let query = format!(
            "UPDATE student_institute_applications \
             SET course_ids = $2, application_count = cardinality($2::BIGINT[]) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApplicationTracker>(&query)
            .bind(tracker_id)
            .bind(course_ids)
            .fetch_one(&mut *conn)
            .await
    }
}
