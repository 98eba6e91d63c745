//! Read-only access to courses for the admission lifecycle.

use admissions_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::course::{CourseForApplication, CreateCourse};

pub struct CourseRepo;

impl CourseRepo {
    /// Load a course together with the institute owning its faculty.
    pub async fn find_for_application(
        conn: &mut PgConnection,
        course_id: DbId,
    ) -> Result<Option<CourseForApplication>, sqlx::Error> {
        sqlx::query_as::<_, CourseForApplication>(
            "SELECT c.id, c.name, c.code, c.application_deadline, c.is_active, \
                    i.id AS institute_id, i.name AS institute_name \
             FROM courses c \
             JOIN faculties f ON f.id = c.faculty_id \
             JOIN institutes i ON i.id = f.institute_id \
             WHERE c.id = $1",
        )
        .bind(course_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Insert a faculty under an institute (seeding and tests).
    pub async fn create_faculty(
        pool: &PgPool,
        institute_id: DbId,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) =
            sqlx::query_as("INSERT INTO faculties (institute_id, name) VALUES ($1, $2) RETURNING id")
                .bind(institute_id)
                .bind(name)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Insert a course (seeding and tests).
    pub async fn create(pool: &PgPool, input: &CreateCourse) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO courses (faculty_id, name, code, application_deadline, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(input.faculty_id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.application_deadline)
        .bind(input.is_active)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
