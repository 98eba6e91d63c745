//! Repository for the `admission_periods` table.

use admissions_core::admission_period::PeriodStatus;
use admissions_core::types::{Date, DbId};
use sqlx::{PgConnection, PgPool};

use crate::models::admission_period::{AdmissionPeriod, CreateAdmissionPeriod};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, institute_id, name, start_date, end_date, status, \
    total_applications, created_at, updated_at";

pub struct AdmissionPeriodRepo;

impl AdmissionPeriodRepo {
    /// Insert a new admission period with the given status.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateAdmissionPeriod,
    ) -> Result<AdmissionPeriod, sqlx::Error> {
        let query = format!(
            "INSERT INTO admission_periods (institute_id, name, start_date, end_date, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(input.institute_id)
            .bind(&input.name)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.status)
            .fetch_one(&mut *conn)
            .await
    }

    /// Lock the active period whose window contains `today`.
    pub async fn lock_active_containing(
        conn: &mut PgConnection,
        institute_id: DbId,
        today: Date,
    ) -> Result<Option<AdmissionPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admission_periods \
             WHERE institute_id = $1 AND status = $2 \
               AND start_date <= $3 AND end_date >= $3 \
             ORDER BY start_date DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(institute_id)
            .bind(PeriodStatus::Active.as_str())
            .bind(today)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock the period the submission fallback should reuse.
    ///
    /// An already active period wins (only one may be active), then upcoming
    /// periods, then the most recent closed one.
    pub async fn lock_fallback(
        conn: &mut PgConnection,
        institute_id: DbId,
    ) -> Result<Option<AdmissionPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admission_periods \
             WHERE institute_id = $1 \
             ORDER BY CASE status WHEN 'active' THEN 0 WHEN 'upcoming' THEN 1 ELSE 2 END, \
                      start_date DESC, id DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(institute_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock a period owned by the given institute.
    pub async fn lock_for_institute(
        conn: &mut PgConnection,
        id: DbId,
        institute_id: DbId,
    ) -> Result<Option<AdmissionPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admission_periods \
             WHERE id = $1 AND institute_id = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(id)
            .bind(institute_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Set the status of a period.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: PeriodStatus,
    ) -> Result<AdmissionPeriod, sqlx::Error> {
        let query = format!(
            "UPDATE admission_periods SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    /// Bump the running application counter by one.
    pub async fn increment_total_applications(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE admission_periods SET total_applications = total_applications + 1 \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// All non-closed periods of the institute, for overlap checks.
    pub async fn list_open(
        conn: &mut PgConnection,
        institute_id: DbId,
    ) -> Result<Vec<AdmissionPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admission_periods \
             WHERE institute_id = $1 AND status <> $2 \
             ORDER BY start_date"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(institute_id)
            .bind(PeriodStatus::Closed.as_str())
            .fetch_all(&mut *conn)
            .await
    }

    /// Find a period by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AdmissionPeriod>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admission_periods WHERE id = $1");
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an institute's periods, newest start first, optionally by status.
    pub async fn list_for_institute(
        pool: &PgPool,
        institute_id: DbId,
        status: Option<PeriodStatus>,
    ) -> Result<Vec<AdmissionPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admission_periods \
             WHERE institute_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY start_date DESC, id DESC"
        );
        sqlx::query_as::<_, AdmissionPeriod>(&query)
            .bind(institute_id)
            .bind(status.map(PeriodStatus::as_str))
            .fetch_all(pool)
            .await
    }
}
