//! Admission period creation and status changes.

use admissions_core::admission_period::{
    initial_status, validate_new_window, validate_publish, PeriodStatus, Window,
    MAX_PERIOD_NAME_LENGTH,
};
use admissions_core::application::NOTE_AUTO_REJECTED_PERIOD_CLOSED;
use admissions_core::error::CoreError;
use admissions_core::types::{Date, DbId};
use admissions_db::models::admission_period::{AdmissionPeriod, CreateAdmissionPeriod};
use admissions_db::repositories::{AdmissionPeriodRepo, ApplicationRepo, InstituteRepo};
use serde::Serialize;

use super::AdmissionLifecycle;
use crate::error::AppResult;

/// An institute's request for a new admission window.
#[derive(Debug, Clone)]
pub struct NewAdmissionPeriod {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Result of a period status change.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodChange {
    pub period: AdmissionPeriod,
    /// Pending applications rejected because the period closed.
    pub auto_rejected: u64,
}

fn window_of(period: &AdmissionPeriod) -> Window {
    Window::new(period.start_date, period.end_date)
}

impl AdmissionLifecycle<'_> {
    /// Create a period for the institute.
    ///
    /// The window must be non-empty, must not start in the past and must not
    /// overlap any of the institute's non-closed periods. The period starts
    /// `active` when today falls inside it, `upcoming` otherwise.
    pub async fn create_period(
        &self,
        institute_id: DbId,
        input: &NewAdmissionPeriod,
    ) -> AppResult<AdmissionPeriod> {
        let name = input.name.trim();
        if name.is_empty() || name.chars().count() as u64 > MAX_PERIOD_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Admission period name must be 1 to {MAX_PERIOD_NAME_LENGTH} characters"
            ))
            .into());
        }

        let today = self.today();
        let window = Window::new(input.start_date, input.end_date);
        validate_new_window(&window, today)?;

        let mut tx = self.pool.begin().await?;

        if !InstituteRepo::lock(&mut tx, institute_id).await? {
            return Err(CoreError::NotFound {
                entity: "Institute",
                id: institute_id,
            }
            .into());
        }

        let open = AdmissionPeriodRepo::list_open(&mut tx, institute_id).await?;
        if let Some(clash) = open.iter().find(|p| window.overlaps(&window_of(p))) {
            return Err(CoreError::Rejected(format!(
                "Admission period overlaps with existing period '{}' ({} to {})",
                clash.name, clash.start_date, clash.end_date
            ))
            .into());
        }

        let status = initial_status(&window, today);
        let period = AdmissionPeriodRepo::create(
            &mut tx,
            &CreateAdmissionPeriod {
                institute_id,
                name: name.to_string(),
                start_date: window.start,
                end_date: window.end,
                status: status.as_str().to_string(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            admission_period_id = period.id,
            institute_id,
            status = %status,
            start_date = %period.start_date,
            end_date = %period.end_date,
            "Admission period created",
        );
        Ok(period)
    }

    /// Move a period along its transition table.
    ///
    /// Closing cascades: every pending application attached to the period is
    /// rejected in the same transaction.
    pub async fn update_period_status(
        &self,
        institute_id: DbId,
        period_id: DbId,
        next: PeriodStatus,
    ) -> AppResult<PeriodChange> {
        let mut tx = self.pool.begin().await?;

        let period = AdmissionPeriodRepo::lock_for_institute(&mut tx, period_id, institute_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AdmissionPeriod",
                id: period_id,
            })?;
        let current: PeriodStatus = period.status.parse()?;
        current.validate_transition(next)?;

        let period = AdmissionPeriodRepo::set_status(&mut tx, period.id, next).await?;
        let auto_rejected = if next == PeriodStatus::Closed {
            ApplicationRepo::reject_pending_in_period(
                &mut tx,
                period.id,
                NOTE_AUTO_REJECTED_PERIOD_CLOSED,
            )
            .await?
        } else {
            0
        };

        tx.commit().await?;

        tracing::info!(
            admission_period_id = period_id,
            institute_id,
            from = %current,
            to = %next,
            auto_rejected,
            "Admission period status updated",
        );
        Ok(PeriodChange {
            period,
            auto_rejected,
        })
    }

    /// Promote an upcoming period whose start date has been reached.
    pub async fn publish_period(
        &self,
        institute_id: DbId,
        period_id: DbId,
    ) -> AppResult<AdmissionPeriod> {
        let today = self.today();
        let mut tx = self.pool.begin().await?;

        let period = AdmissionPeriodRepo::lock_for_institute(&mut tx, period_id, institute_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AdmissionPeriod",
                id: period_id,
            })?;
        let current: PeriodStatus = period.status.parse()?;
        validate_publish(current, period.start_date, today)?;

        let period = AdmissionPeriodRepo::set_status(&mut tx, period.id, PeriodStatus::Active).await?;

        tx.commit().await?;

        tracing::info!(
            admission_period_id = period_id,
            institute_id,
            "Admission period published",
        );
        Ok(period)
    }
}
