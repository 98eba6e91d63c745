//! Admission period resolution at submission time.

use admissions_core::admission_period::{PeriodStatus, Window, PLACEHOLDER_PERIOD_NAME};
use admissions_core::error::CoreError;
use admissions_core::types::{Date, DbId};
use admissions_db::models::admission_period::{AdmissionPeriod, CreateAdmissionPeriod};
use admissions_db::repositories::{AdmissionPeriodRepo, InstituteRepo};
use sqlx::PgConnection;

use crate::config::AdmissionPolicy;
use crate::error::AppResult;

/// Return the locked admission period a new application to `institute_id`
/// should join.
///
/// The active period whose window contains `today` wins. Without one, and
/// only when [`AdmissionPolicy::auto_open_periods`] is set, the institute row
/// is locked and an existing period is forced to `active` (an active one
/// first, then upcoming, then the most recent closed), or a placeholder
/// period spanning a year from today is created. This writes, so it must run
/// inside the submission transaction.
pub async fn resolve_period(
    conn: &mut PgConnection,
    institute_id: DbId,
    today: Date,
    policy: &AdmissionPolicy,
) -> AppResult<AdmissionPeriod> {
    if let Some(period) = AdmissionPeriodRepo::lock_active_containing(conn, institute_id, today).await?
    {
        return Ok(period);
    }

    if !policy.auto_open_periods {
        return Err(CoreError::Rejected(
            "This institute is not currently accepting applications".to_string(),
        )
        .into());
    }

    if !InstituteRepo::lock(conn, institute_id).await? {
        return Err(CoreError::NotFound {
            entity: "Institute",
            id: institute_id,
        }
        .into());
    }

    // A concurrent submission may have opened a period while we waited.
    if let Some(period) = AdmissionPeriodRepo::lock_active_containing(conn, institute_id, today).await?
    {
        return Ok(period);
    }

    if let Some(period) = AdmissionPeriodRepo::lock_fallback(conn, institute_id).await? {
        tracing::warn!(
            institute_id,
            admission_period_id = period.id,
            previous_status = %period.status,
            "No active admission period covers today; forcing existing period active",
        );
        if period.status == PeriodStatus::Active.as_str() {
            return Ok(period);
        }
        let promoted =
            AdmissionPeriodRepo::set_status(conn, period.id, PeriodStatus::Active).await?;
        return Ok(promoted);
    }

    let window = Window::placeholder(today);
    let period = AdmissionPeriodRepo::create(
        conn,
        &CreateAdmissionPeriod {
            institute_id,
            name: PLACEHOLDER_PERIOD_NAME.to_string(),
            start_date: window.start,
            end_date: window.end,
            status: PeriodStatus::Active.as_str().to_string(),
        },
    )
    .await?;

    tracing::warn!(
        institute_id,
        admission_period_id = period.id,
        end_date = %period.end_date,
        "Institute had no admission period; created placeholder period",
    );
    Ok(period)
}
