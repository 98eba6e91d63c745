//! Student and institute profile lookups and row locks.
//!
//! Profiles are owned by the account management layer; the lifecycle only
//! resolves them from a user id and locks them to serialise its writes.
//!
//! Locks are `FOR NO KEY UPDATE`: inserts into tables referencing these rows
//! take `FOR KEY SHARE`, which must not conflict with the lock.

use admissions_core::types::DbId;
use sqlx::{PgConnection, PgPool};

pub struct StudentRepo;

impl StudentRepo {
    /// Resolve the student profile id of a user.
    pub async fn find_id_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM students WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Lock a student row. Every lifecycle write touching the student's
    /// applications takes this lock first.
    pub async fn lock(conn: &mut PgConnection, student_id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM students WHERE id = $1 FOR NO KEY UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a student profile for a user (seeding and tests).
    pub async fn create(pool: &PgPool, user_id: DbId) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as("INSERT INTO students (user_id) VALUES ($1) RETURNING id")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

pub struct InstituteRepo;

impl InstituteRepo {
    /// Resolve the institute profile id of a user.
    pub async fn find_id_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM institutes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Lock an institute row to serialise period creation and auto-opening.
    pub async fn lock(conn: &mut PgConnection, institute_id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM institutes WHERE id = $1 FOR NO KEY UPDATE")
                .bind(institute_id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.is_some())
    }

    /// Insert an institute profile (seeding and tests).
    pub async fn create(
        pool: &PgPool,
        user_id: Option<DbId>,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) =
            sqlx::query_as("INSERT INTO institutes (user_id, name) VALUES ($1, $2) RETURNING id")
                .bind(user_id)
                .bind(name)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
