//! System-wide aggregate queries for the admin overview.

use sqlx::PgPool;

use crate::models::stats::SystemStats;

pub struct StatsRepo;

impl StatsRepo {
    pub async fn system_stats(pool: &PgPool) -> Result<SystemStats, sqlx::Error> {
        sqlx::query_as::<_, SystemStats>(
            "SELECT \
                (SELECT COUNT(*) FROM users WHERE user_type = 'student' AND is_active) \
                    AS total_students, \
                (SELECT COUNT(*) FROM users WHERE user_type = 'institute' AND is_active) \
                    AS total_institutes, \
                (SELECT COUNT(*) FROM applications) AS total_applications, \
                (SELECT COUNT(*) FROM admission_periods WHERE status = 'active') \
                    AS active_admissions, \
                (SELECT COUNT(*) FROM applications WHERE status = 'pending') \
                    AS pending_applications, \
                (SELECT COUNT(*) FROM applications WHERE status = 'accepted') \
                    AS accepted_applications, \
                (SELECT COUNT(*) FROM courses WHERE is_active) AS active_courses",
        )
        .fetch_one(pool)
        .await
    }
}
