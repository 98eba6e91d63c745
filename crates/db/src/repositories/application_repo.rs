//! Repository for the `applications` table.
//!
//! Rows are never deleted; every change after insertion is a status update.
//! Methods taking `&mut PgConnection` are meant to run inside the lifecycle
//! transaction; the `FOR UPDATE` variants lock the row they return.

use admissions_core::application::ApplicationStatus;
use admissions_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::application::{
    AcceptedPlacement, AdminApplicationFilter, AdminApplicationView, Application,
    CreateApplication, InstituteApplicationFilter, InstituteApplicationView,
    StudentApplicationView,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, course_id, institute_id, admission_period_id, \
    preferred_major, personal_statement, status, submitted_at, reviewed_at, review_notes, \
    documents, created_at, updated_at";

/// Same columns qualified with the `a.` alias for joined queries.
const A_COLUMNS: &str = "a.id, a.student_id, a.course_id, a.institute_id, \
    a.admission_period_id, a.preferred_major, a.personal_statement, a.status, a.submitted_at, \
    a.reviewed_at, a.review_notes, a.documents, a.created_at, a.updated_at";

pub struct ApplicationRepo;

impl ApplicationRepo {
    // ── Writes (transactional) ───────────────────────────────────────

    /// Insert a new `pending` application.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications \
                (student_id, course_id, institute_id, admission_period_id, preferred_major, \
                 personal_statement, documents, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(input.student_id)
            .bind(input.course_id)
            .bind(input.institute_id)
            .bind(input.admission_period_id)
            .bind(&input.preferred_major)
            .bind(&input.personal_statement)
            .bind(&input.documents)
            .bind(ApplicationStatus::Pending.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    /// Set status, review notes and review timestamp on one application.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: DbId,
        status: ApplicationStatus,
        review_notes: Option<&str>,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "UPDATE applications \
             SET status = $2, review_notes = $3, reviewed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(review_notes)
            .fetch_one(&mut *conn)
            .await
    }

    /// Reject every other `pending` application of a student.
    ///
    /// Returns the ids of the rejected applications.
    pub async fn reject_other_pending(
        conn: &mut PgConnection,
        student_id: DbId,
        except_id: DbId,
        note: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "UPDATE applications \
             SET status = $4, review_notes = $5, reviewed_at = NOW() \
             WHERE student_id = $1 AND id <> $2 AND status = $3 \
             RETURNING id",
        )
        .bind(student_id)
        .bind(except_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(ApplicationStatus::Rejected.as_str())
        .bind(note)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Reject every `pending` application attached to an admission period.
    ///
    /// Returns the number of rejected applications.
    pub async fn reject_pending_in_period(
        conn: &mut PgConnection,
        admission_period_id: DbId,
        note: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications \
             SET status = $3, review_notes = $4, reviewed_at = NOW() \
             WHERE admission_period_id = $1 AND status = $2",
        )
        .bind(admission_period_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(ApplicationStatus::Rejected.as_str())
        .bind(note)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    // ── Locked reads (transactional) ─────────────────────────────────

    /// Lock an application owned by the given student.
    pub async fn lock_for_student(
        conn: &mut PgConnection,
        id: DbId,
        student_id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications \
             WHERE id = $1 AND student_id = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(student_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock an application whose course belongs to the institute's faculty tree.
    pub async fn lock_for_institute(
        conn: &mut PgConnection,
        id: DbId,
        institute_id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {A_COLUMNS} FROM applications a \
             JOIN courses c ON c.id = a.course_id \
             JOIN faculties f ON f.id = c.faculty_id \
             WHERE a.id = $1 AND f.institute_id = $2 \
             FOR UPDATE OF a"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(institute_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find an accepted application of the student other than `except_id`,
    /// optionally restricted to institutes other than `other_than_institute`.
    pub async fn find_accepted_placement(
        conn: &mut PgConnection,
        student_id: DbId,
        except_id: Option<DbId>,
        other_than_institute: Option<DbId>,
    ) -> Result<Option<AcceptedPlacement>, sqlx::Error> {
        sqlx::query_as::<_, AcceptedPlacement>(
            "SELECT a.id AS application_id, a.institute_id, i.name AS institute_name \
             FROM applications a \
             JOIN institutes i ON i.id = a.institute_id \
             WHERE a.student_id = $1 AND a.status = $2 \
               AND ($3::BIGINT IS NULL OR a.id <> $3) \
               AND ($4::BIGINT IS NULL OR a.institute_id <> $4) \
             LIMIT 1",
        )
        .bind(student_id)
        .bind(ApplicationStatus::Accepted.as_str())
        .bind(except_id)
        .bind(other_than_institute)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Whether the student already applied to the course within the
    /// institute's currently active admission period.
    pub async fn exists_in_active_period(
        conn: &mut PgConnection,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM applications a \
                 JOIN admission_periods ap ON ap.id = a.admission_period_id \
                 WHERE a.student_id = $1 AND a.course_id = $2 AND ap.status = 'active' \
             )",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    // ── Plain reads ──────────────────────────────────────────────────

    /// Find an application by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A student's applications joined with course, institute and period
    /// names, newest first.
    pub async fn list_views_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<StudentApplicationView>, sqlx::Error> {
        sqlx::query_as::<_, StudentApplicationView>(
            "SELECT a.id, a.status, a.submitted_at, a.reviewed_at, a.review_notes, \
                    a.preferred_major, \
                    c.id AS course_id, c.name AS course_name, c.code AS course_code, \
                    i.id AS institute_id, i.name AS institute_name, \
                    i.location AS institute_location, \
                    ap.name AS admission_period, ap.status AS admission_status \
             FROM applications a \
             JOIN courses c ON c.id = a.course_id \
             JOIN institutes i ON i.id = a.institute_id \
             LEFT JOIN admission_periods ap ON ap.id = a.admission_period_id \
             WHERE a.student_id = $1 \
             ORDER BY a.submitted_at DESC, a.id DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    /// Applications to courses of an institute, newest first, paginated.
    pub async fn list_views_for_institute(
        pool: &PgPool,
        institute_id: DbId,
        filter: &InstituteApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InstituteApplicationView>, sqlx::Error> {
        sqlx::query_as::<_, InstituteApplicationView>(
            "SELECT a.id, a.student_id, a.course_id, a.admission_period_id, a.preferred_major, \
                    a.personal_statement, a.status, a.submitted_at, a.reviewed_at, \
                    a.review_notes, a.documents, \
                    c.name AS course_name, c.code AS course_code, \
                    u.name AS student_name, u.email AS student_email \
             FROM applications a \
             JOIN courses c ON c.id = a.course_id \
             JOIN faculties f ON f.id = c.faculty_id \
             JOIN students s ON s.id = a.student_id \
             JOIN users u ON u.id = s.user_id \
             WHERE f.institute_id = $1 \
               AND ($2::TEXT IS NULL OR a.status = $2) \
               AND ($3::BIGINT IS NULL OR a.course_id = $3) \
             ORDER BY a.submitted_at DESC, a.id DESC \
             LIMIT $4 OFFSET $5",
        )
        .bind(institute_id)
        .bind(&filter.status)
        .bind(filter.course_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Count applications matching the same filter as
    /// [`ApplicationRepo::list_views_for_institute`].
    pub async fn count_for_institute(
        pool: &PgPool,
        institute_id: DbId,
        filter: &InstituteApplicationFilter,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications a \
             JOIN courses c ON c.id = a.course_id \
             JOIN faculties f ON f.id = c.faculty_id \
             WHERE f.institute_id = $1 \
               AND ($2::TEXT IS NULL OR a.status = $2) \
               AND ($3::BIGINT IS NULL OR a.course_id = $3)",
        )
        .bind(institute_id)
        .bind(&filter.status)
        .bind(filter.course_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Every application across institutes, newest first, paginated.
    pub async fn list_views_for_admin(
        pool: &PgPool,
        filter: &AdminApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminApplicationView>, sqlx::Error> {
        sqlx::query_as::<_, AdminApplicationView>(
            "SELECT a.id, a.student_id, a.course_id, a.institute_id, a.admission_period_id, \
                    a.status, a.submitted_at, a.reviewed_at, a.review_notes, \
                    u.name AS student_name, u.email AS student_email, \
                    c.name AS course_name, i.name AS institute_name, \
                    ap.name AS admission_period \
             FROM applications a \
             JOIN students s ON s.id = a.student_id \
             JOIN users u ON u.id = s.user_id \
             JOIN courses c ON c.id = a.course_id \
             JOIN institutes i ON i.id = a.institute_id \
             LEFT JOIN admission_periods ap ON ap.id = a.admission_period_id \
             WHERE ($1::TEXT IS NULL OR a.status = $1) \
               AND ($2::BIGINT IS NULL OR a.institute_id = $2) \
             ORDER BY a.submitted_at DESC, a.id DESC \
             LIMIT $3 OFFSET $4",
        )
        .bind(&filter.status)
        .bind(filter.institute_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Count applications matching the same filter as
    /// [`ApplicationRepo::list_views_for_admin`].
    pub async fn count_for_admin(
        pool: &PgPool,
        filter: &AdminApplicationFilter,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications a \
             WHERE ($1::TEXT IS NULL OR a.status = $1) \
               AND ($2::BIGINT IS NULL OR a.institute_id = $2)",
        )
        .bind(&filter.status)
        .bind(filter.institute_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
