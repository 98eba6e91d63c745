//! Submission, review and withdrawal of applications.

use admissions_core::application::{
    validate_personal_statement, validate_review_target, ApplicationStatus,
    NOTE_AUTO_REJECTED_ACCEPTED_ELSEWHERE, NOTE_WITHDRAWN_BY_STUDENT,
};
use admissions_core::error::CoreError;
use admissions_core::quota::{academic_year, QuotaStatus};
use admissions_core::types::DbId;
use admissions_db::models::application::{Application, CreateApplication};
use admissions_db::repositories::{
    AdmissionPeriodRepo, ApplicationRepo, CourseRepo, StudentRepo,
};
use serde::Serialize;

use super::quota::QuotaTracker;
use super::resolver::resolve_period;
use super::AdmissionLifecycle;
use crate::error::AppResult;

/// A student's submission.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub course_id: DbId,
    pub preferred_major: Option<String>,
    pub personal_statement: String,
    pub documents: Vec<String>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: DbId,
    pub admission_period_id: DbId,
    /// Slots left at the course's institute after this application.
    pub remaining_slots: i32,
}

/// Result of a review status change.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub application: Application,
    /// Pending applications of the same student rejected by an acceptance.
    pub auto_rejected: Vec<DbId>,
}

impl AdmissionLifecycle<'_> {
    /// Submit an application.
    ///
    /// Checks run in a fixed order and the first failure wins: course
    /// exists and is active, deadline not passed, no acceptance at another
    /// institute, quota slot free, no duplicate in the active period.
    pub async fn submit(
        &self,
        student_id: DbId,
        input: &NewApplication,
    ) -> AppResult<SubmissionReceipt> {
        validate_personal_statement(&input.personal_statement)?;
        let today = self.today();

        let mut tx = self.pool.begin().await?;

        if !StudentRepo::lock(&mut tx, student_id).await? {
            return Err(CoreError::NotFound {
                entity: "Student",
                id: student_id,
            }
            .into());
        }

        let course = CourseRepo::find_for_application(&mut tx, input.course_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: input.course_id,
            })?;
        if !course.is_active {
            return Err(CoreError::Rejected(
                "This course is not currently accepting applications".to_string(),
            )
            .into());
        }

        if course.application_deadline.is_some_and(|deadline| deadline < today) {
            return Err(CoreError::Rejected(
                "Application deadline has passed for this course".to_string(),
            )
            .into());
        }

        if let Some(placement) = ApplicationRepo::find_accepted_placement(
            &mut tx,
            student_id,
            None,
            Some(course.institute_id),
        )
        .await?
        {
            return Err(CoreError::Rejected(format!(
                "You are already admitted to {}. You cannot apply to other institutes.",
                placement.institute_name
            ))
            .into());
        }

        let quota =
            QuotaTracker::lock(&mut tx, student_id, course.institute_id, academic_year(today))
                .await?;
        quota.status().ensure_can_apply()?;

        if ApplicationRepo::exists_in_active_period(&mut tx, student_id, course.id).await? {
            return Err(CoreError::Conflict(
                "You have already applied to this course in the current admission period"
                    .to_string(),
            )
            .into());
        }

        let period = resolve_period(&mut tx, course.institute_id, today, self.policy).await?;

        let application = ApplicationRepo::create(
            &mut tx,
            &CreateApplication {
                student_id,
                course_id: course.id,
                institute_id: course.institute_id,
                admission_period_id: period.id,
                preferred_major: input.preferred_major.clone(),
                personal_statement: input.personal_statement.clone(),
                documents: input.documents.clone(),
            },
        )
        .await?;

        let tracker = quota.track(&mut tx, course.id).await?;
        AdmissionPeriodRepo::increment_total_applications(&mut tx, period.id).await?;

        tx.commit().await?;

        let remaining_slots = QuotaStatus::from_courses(tracker.course_ids).remaining_slots;
        tracing::info!(
            application_id = application.id,
            student_id,
            course_id = course.id,
            institute_id = course.institute_id,
            admission_period_id = period.id,
            remaining_slots,
            "Application submitted",
        );

        Ok(SubmissionReceipt {
            application_id: application.id,
            admission_period_id: period.id,
            remaining_slots,
        })
    }

    /// Move an application of one of the institute's courses to a review
    /// status.
    ///
    /// Accepting cascades: every other pending application of the student is
    /// rejected in the same transaction. Accepting is refused while the
    /// student holds another accepted application.
    pub async fn update_status(
        &self,
        institute_id: DbId,
        application_id: DbId,
        next: ApplicationStatus,
        review_notes: Option<&str>,
    ) -> AppResult<StatusChange> {
        validate_review_target(next)?;

        let mut tx = self.pool.begin().await?;

        let application = ApplicationRepo::lock_for_institute(&mut tx, application_id, institute_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Application",
                id: application_id,
            })?;
        StudentRepo::lock(&mut tx, application.student_id).await?;

        let current: ApplicationStatus = application.status.parse()?;
        current.validate_transition(next)?;

        let mut auto_rejected = Vec::new();
        if next == ApplicationStatus::Accepted {
            if let Some(placement) = ApplicationRepo::find_accepted_placement(
                &mut tx,
                application.student_id,
                Some(application.id),
                None,
            )
            .await?
            {
                return Err(CoreError::Rejected(format!(
                    "Student is already admitted to {}. Cannot accept application.",
                    placement.institute_name
                ))
                .into());
            }

            auto_rejected = ApplicationRepo::reject_other_pending(
                &mut tx,
                application.student_id,
                application.id,
                NOTE_AUTO_REJECTED_ACCEPTED_ELSEWHERE,
            )
            .await?;
        }

        let updated =
            ApplicationRepo::update_status(&mut tx, application.id, next, review_notes).await?;

        tx.commit().await?;

        tracing::info!(
            application_id,
            institute_id,
            student_id = updated.student_id,
            from = %current,
            to = %next,
            auto_rejected = auto_rejected.len(),
            "Application status updated",
        );

        Ok(StatusChange {
            application: updated,
            auto_rejected,
        })
    }

    /// Withdraw one of the student's pending applications and free its
    /// quota slot.
    pub async fn withdraw(&self, student_id: DbId, application_id: DbId) -> AppResult<Application> {
        let mut tx = self.pool.begin().await?;

        let application = ApplicationRepo::lock_for_student(&mut tx, application_id, student_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Application",
                id: application_id,
            })?;

        let current: ApplicationStatus = application.status.parse()?;
        if current != ApplicationStatus::Pending {
            return Err(CoreError::Rejected(
                "Only pending applications can be withdrawn".to_string(),
            )
            .into());
        }

        let updated = ApplicationRepo::update_status(
            &mut tx,
            application.id,
            ApplicationStatus::Withdrawn,
            Some(NOTE_WITHDRAWN_BY_STUDENT),
        )
        .await?;

        let released = QuotaTracker::release(
            &mut tx,
            student_id,
            application.institute_id,
            academic_year(application.submitted_at.date_naive()),
            application.course_id,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            application_id,
            student_id,
            course_id = application.course_id,
            released,
            "Application withdrawn",
        );
        Ok(updated)
    }

    /// Quota status of the student at an institute for the current year.
    pub async fn can_apply(&self, student_id: DbId, institute_id: DbId) -> AppResult<QuotaStatus> {
        Ok(QuotaTracker::can_apply(self.pool, student_id, institute_id, self.today()).await?)
    }
}
