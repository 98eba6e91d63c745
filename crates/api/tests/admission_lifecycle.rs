//! Integration tests for the admission lifecycle manager, driven directly
//! against a real database.

mod common;

use admissions_api::config::AdmissionPolicy;
use admissions_api::error::AppError;
use admissions_api::lifecycle::{
    AdmissionLifecycle, NewAdmissionPeriod, NewApplication, QuotaTracker,
};
use admissions_core::admission_period::{PeriodStatus, PLACEHOLDER_PERIOD_NAME};
use admissions_core::application::{
    ApplicationStatus, NOTE_AUTO_REJECTED_ACCEPTED_ELSEWHERE, NOTE_AUTO_REJECTED_PERIOD_CLOSED,
    NOTE_WITHDRAWN_BY_STUDENT,
};
use admissions_core::error::CoreError;
use admissions_core::quota::academic_year;
use admissions_core::types::DbId;
use admissions_db::repositories::{AdmissionPeriodRepo, ApplicationRepo};
use assert_matches::assert_matches;
use common::*;
use sqlx::{PgPool, Postgres, Transaction};

fn application(course_id: DbId) -> NewApplication {
    NewApplication {
        course_id,
        preferred_major: Some("Computer Science".to_string()),
        personal_statement: STATEMENT.to_string(),
        documents: vec!["transcript.pdf".to_string()],
    }
}

async fn status_of(pool: &PgPool, application_id: DbId) -> String {
    ApplicationRepo::find_by_id(pool, application_id)
        .await
        .unwrap()
        .expect("application exists")
        .status
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// Two courses fill the quota; the third is refused and nothing changes.
#[sqlx::test(migrations = "../../db/migrations")]
async fn third_application_to_same_institute_is_rejected(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "quota").await;
    let inst = seed_institute(&pool, "Quota Institute").await;
    let deadline = Some(days_from_today(365));
    let c1 = seed_course(&pool, inst.faculty_id, "Q-1", deadline).await;
    let c2 = seed_course(&pool, inst.faculty_id, "Q-2", deadline).await;
    let c3 = seed_course(&pool, inst.faculty_id, "Q-3", deadline).await;

    let first = lifecycle.submit(student.student_id, &application(c1)).await.unwrap();
    assert_eq!(first.remaining_slots, 1);

    // No period existed: a placeholder was opened.
    let period = AdmissionPeriodRepo::find_by_id(&pool, first.admission_period_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(period.name, PLACEHOLDER_PERIOD_NAME);
    assert_eq!(period.status, "active");
    assert_eq!(period.start_date, today());

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 1);
    assert_eq!(tracker.course_ids, vec![c1]);

    let second = lifecycle.submit(student.student_id, &application(c2)).await.unwrap();
    assert_eq!(second.remaining_slots, 0);
    assert_eq!(second.admission_period_id, period.id);

    let err = lifecycle
        .submit(student.student_id, &application(c3))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg.contains("maximum 2 courses per institute")
    );

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 2);
    assert_eq!(tracker.course_ids, vec![c1, c2]);
    assert_eq!(count_rows(&pool, "applications").await, 2);

    let period = AdmissionPeriodRepo::find_by_id(&pool, period.id).await.unwrap().unwrap();
    assert_eq!(period.total_applications, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn quota_is_per_institute(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "spread").await;
    let a = seed_institute(&pool, "Alpha College").await;
    let b = seed_institute(&pool, "Beta College").await;
    let a1 = seed_course(&pool, a.faculty_id, "A-1", None).await;
    let a2 = seed_course(&pool, a.faculty_id, "A-2", None).await;
    let b1 = seed_course(&pool, b.faculty_id, "B-1", None).await;

    lifecycle.submit(student.student_id, &application(a1)).await.unwrap();
    lifecycle.submit(student.student_id, &application(a2)).await.unwrap();
    let receipt = lifecycle.submit(student.student_id, &application(b1)).await.unwrap();
    assert_eq!(receipt.remaining_slots, 1);

    let quota = lifecycle.can_apply(student.student_id, a.institute_id).await.unwrap();
    assert!(!quota.can_apply);
    assert_eq!(quota.current_count, 2);

    let quota = lifecycle.can_apply(student.student_id, b.institute_id).await.unwrap();
    assert!(quota.can_apply);
    assert_eq!(quota.applied_course_ids, vec![b1]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_checks_course_state(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "checks").await;
    let inst = seed_institute(&pool, "Checks Institute").await;
    let inactive = seed_course_with(&pool, inst.faculty_id, "C-OFF", None, false).await;
    let expired = seed_course(&pool, inst.faculty_id, "C-OLD", Some(days_from_today(-1))).await;
    let due_today = seed_course(&pool, inst.faculty_id, "C-TODAY", Some(today())).await;

    let err = lifecycle.submit(student.student_id, &application(9_999)).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::NotFound { entity: "Course", id: 9_999 }));

    let err = lifecycle.submit(student.student_id, &application(inactive)).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg == "This course is not currently accepting applications"
    );

    let err = lifecycle.submit(student.student_id, &application(expired)).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg == "Application deadline has passed for this course"
    );

    // The deadline day itself is still open.
    lifecycle.submit(student.student_id, &application(due_today)).await.unwrap();

    // Refused submissions left no trace.
    assert_eq!(count_rows(&pool, "applications").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn short_personal_statement_is_refused(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "brief").await;
    let inst = seed_institute(&pool, "Brief Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "BR-1", None).await;

    let mut input = application(course);
    input.personal_statement = "Too short.".to_string();
    let err = lifecycle.submit(student.student_id, &input).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_submission_in_active_period_conflicts(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "dup").await;
    let inst = seed_institute(&pool, "Dup Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "D-1", None).await;

    lifecycle.submit(student.student_id, &application(course)).await.unwrap();
    let err = lifecycle.submit(student.student_id, &application(course)).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Conflict(_)));

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submission_joins_active_period_covering_today(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "joiner").await;
    let inst = seed_institute(&pool, "Joiner Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "J-1", None).await;
    let period = seed_period(&pool, inst.institute_id, days_from_today(-10), days_from_today(20), "active").await;

    let receipt = lifecycle.submit(student.student_id, &application(course)).await.unwrap();
    assert_eq!(receipt.admission_period_id, period.id);
    assert_eq!(count_rows(&pool, "admission_periods").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fallback_promotes_existing_upcoming_period(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "early").await;
    let inst = seed_institute(&pool, "Early Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "E-1", None).await;
    let upcoming =
        seed_period(&pool, inst.institute_id, days_from_today(30), days_from_today(90), "upcoming").await;

    let receipt = lifecycle.submit(student.student_id, &application(course)).await.unwrap();
    assert_eq!(receipt.admission_period_id, upcoming.id);

    let period = AdmissionPeriodRepo::find_by_id(&pool, upcoming.id).await.unwrap().unwrap();
    assert_eq!(period.status, "active");
    assert_eq!(period.total_applications, 1);
    assert_eq!(count_rows(&pool, "admission_periods").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabled_auto_open_refuses_and_rolls_back(pool: PgPool) {
    let policy = AdmissionPolicy {
        auto_open_periods: false,
    };
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "closed").await;
    let inst = seed_institute(&pool, "Closed Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "X-1", None).await;

    let err = lifecycle.submit(student.student_id, &application(course)).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg.contains("not currently accepting applications")
    );

    assert_eq!(count_rows(&pool, "applications").await, 0);
    assert_eq!(count_rows(&pool, "admission_periods").await, 0);
    // The seeded tracker row went away with the rollback.
    assert!(tracker_for(&pool, student.student_id, inst.institute_id).await.is_none());
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// Accepting at one institute rejects the student's other pending
/// applications and blocks new submissions elsewhere.
#[sqlx::test(migrations = "../../db/migrations")]
async fn acceptance_cascades_to_other_pending_applications(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "placed").await;
    let first = seed_institute(&pool, "First University").await;
    let second = seed_institute(&pool, "Second University").await;
    let c = seed_course(&pool, first.faculty_id, "F-1", None).await;
    let d = seed_course(&pool, second.faculty_id, "S-1", None).await;
    let e = seed_course(&pool, second.faculty_id, "S-2", None).await;

    let a_c = lifecycle.submit(student.student_id, &application(c)).await.unwrap();
    let a_d = lifecycle.submit(student.student_id, &application(d)).await.unwrap();

    let change = lifecycle
        .update_status(first.institute_id, a_c.application_id, ApplicationStatus::Accepted, Some("Welcome"))
        .await
        .unwrap();
    assert_eq!(change.application.status, "accepted");
    assert_eq!(change.application.review_notes.as_deref(), Some("Welcome"));
    assert!(change.application.reviewed_at.is_some());
    assert_eq!(change.auto_rejected, vec![a_d.application_id]);

    let other = ApplicationRepo::find_by_id(&pool, a_d.application_id).await.unwrap().unwrap();
    assert_eq!(other.status, "rejected");
    assert_eq!(other.review_notes.as_deref(), Some(NOTE_AUTO_REJECTED_ACCEPTED_ELSEWHERE));
    assert!(other.reviewed_at.is_some());

    let err = lifecycle.submit(student.student_id, &application(e)).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg))
            if msg == "You are already admitted to First University. You cannot apply to other institutes."
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_acceptance_is_refused(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "double").await;
    let first = seed_institute(&pool, "North Institute").await;
    let second = seed_institute(&pool, "South Institute").await;
    let c = seed_course(&pool, first.faculty_id, "N-1", None).await;
    let d = seed_course(&pool, second.faculty_id, "SO-1", None).await;

    let a_c = lifecycle.submit(student.student_id, &application(c)).await.unwrap();
    let a_d = lifecycle.submit(student.student_id, &application(d)).await.unwrap();

    // Under review is not pending, so the cascade leaves it alone.
    lifecycle
        .update_status(second.institute_id, a_d.application_id, ApplicationStatus::UnderReview, None)
        .await
        .unwrap();
    let change = lifecycle
        .update_status(first.institute_id, a_c.application_id, ApplicationStatus::Accepted, None)
        .await
        .unwrap();
    assert!(change.auto_rejected.is_empty());

    let err = lifecycle
        .update_status(second.institute_id, a_d.application_id, ApplicationStatus::Accepted, None)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg))
            if msg == "Student is already admitted to North Institute. Cannot accept application."
    );
    assert_eq!(status_of(&pool, a_d.application_id).await, "under_review");

    // Rejecting is still possible.
    lifecycle
        .update_status(second.institute_id, a_d.application_id, ApplicationStatus::Rejected, None)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_enforces_transition_table_and_ownership(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "table").await;
    let owner = seed_institute(&pool, "Owner Institute").await;
    let stranger = seed_institute(&pool, "Stranger Institute").await;
    let course = seed_course(&pool, owner.faculty_id, "O-1", None).await;
    let receipt = lifecycle.submit(student.student_id, &application(course)).await.unwrap();
    let id = receipt.application_id;

    let err = lifecycle
        .update_status(stranger.institute_id, id, ApplicationStatus::Rejected, None)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::NotFound { entity: "Application", .. }));

    let err = lifecycle
        .update_status(owner.institute_id, id, ApplicationStatus::Withdrawn, None)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Validation(_)));

    lifecycle
        .update_status(owner.institute_id, id, ApplicationStatus::Rejected, Some("Not this year"))
        .await
        .unwrap();

    for next in [ApplicationStatus::Accepted, ApplicationStatus::UnderReview, ApplicationStatus::Rejected] {
        let err = lifecycle
            .update_status(owner.institute_id, id, next, None)
            .await
            .unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Rejected(_)));
    }
    assert_eq!(status_of(&pool, id).await, "rejected");
}

// ---------------------------------------------------------------------------
// Withdraw
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn withdrawal_frees_the_quota_slot(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let student = seed_student(&pool, "leaver").await;
    let inst = seed_institute(&pool, "Leaver Institute").await;
    let c1 = seed_course(&pool, inst.faculty_id, "L-1", None).await;
    let c2 = seed_course(&pool, inst.faculty_id, "L-2", None).await;
    let c3 = seed_course(&pool, inst.faculty_id, "L-3", None).await;

    let first = lifecycle.submit(student.student_id, &application(c1)).await.unwrap();
    lifecycle.submit(student.student_id, &application(c2)).await.unwrap();

    let withdrawn = lifecycle
        .withdraw(student.student_id, first.application_id)
        .await
        .unwrap();
    assert_eq!(withdrawn.status, "withdrawn");
    assert_eq!(withdrawn.review_notes.as_deref(), Some(NOTE_WITHDRAWN_BY_STUDENT));

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 1);
    assert_eq!(tracker.course_ids, vec![c2]);

    // The freed slot can be used for another course.
    let receipt = lifecycle.submit(student.student_id, &application(c3)).await.unwrap();
    assert_eq!(receipt.remaining_slots, 0);

    let err = lifecycle
        .withdraw(student.student_id, first.application_id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg == "Only pending applications can be withdrawn"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_own_pending_applications_can_be_withdrawn(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let owner = seed_student(&pool, "owner").await;
    let other = seed_student(&pool, "other").await;
    let inst = seed_institute(&pool, "Review Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "R-1", None).await;
    let receipt = lifecycle.submit(owner.student_id, &application(course)).await.unwrap();

    let err = lifecycle
        .withdraw(other.student_id, receipt.application_id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::NotFound { .. }));

    lifecycle
        .update_status(inst.institute_id, receipt.application_id, ApplicationStatus::UnderReview, None)
        .await
        .unwrap();
    let err = lifecycle
        .withdraw(owner.student_id, receipt.application_id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Rejected(_)));

    let tracker = tracker_for(&pool, owner.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 1);
}

// ---------------------------------------------------------------------------
// Admission periods
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn closing_a_period_rejects_its_pending_applications(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let inst = seed_institute(&pool, "Closing Institute").await;
    let period = seed_period(&pool, inst.institute_id, days_from_today(-5), days_from_today(25), "active").await;
    let c1 = seed_course(&pool, inst.faculty_id, "CL-1", None).await;
    let c2 = seed_course(&pool, inst.faculty_id, "CL-2", None).await;

    let s1 = seed_student(&pool, "one").await;
    let s2 = seed_student(&pool, "two").await;
    let s3 = seed_student(&pool, "three").await;
    let p1 = lifecycle.submit(s1.student_id, &application(c1)).await.unwrap();
    let p2 = lifecycle.submit(s2.student_id, &application(c2)).await.unwrap();
    let reviewed = lifecycle.submit(s3.student_id, &application(c1)).await.unwrap();
    lifecycle
        .update_status(inst.institute_id, reviewed.application_id, ApplicationStatus::UnderReview, None)
        .await
        .unwrap();

    let change = lifecycle
        .update_period_status(inst.institute_id, period.id, PeriodStatus::Closed)
        .await
        .unwrap();
    assert_eq!(change.period.status, "closed");
    assert_eq!(change.auto_rejected, 2);

    for id in [p1.application_id, p2.application_id] {
        let app = ApplicationRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(app.status, "rejected");
        assert_eq!(app.review_notes.as_deref(), Some(NOTE_AUTO_REJECTED_PERIOD_CLOSED));
    }
    assert_eq!(status_of(&pool, reviewed.application_id).await, "under_review");

    let err = lifecycle
        .update_period_status(inst.institute_id, period.id, PeriodStatus::Active)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Rejected(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn period_updates_require_ownership(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let owner = seed_institute(&pool, "Owning Institute").await;
    let stranger = seed_institute(&pool, "Other Institute").await;
    let period = seed_period(&pool, owner.institute_id, days_from_today(10), days_from_today(40), "upcoming").await;

    let err = lifecycle
        .update_period_status(stranger.institute_id, period.id, PeriodStatus::Closed)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::NotFound { entity: "AdmissionPeriod", .. }));

    let err = lifecycle
        .publish_period(stranger.institute_id, period.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_period_validates_window_and_overlap(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let inst = seed_institute(&pool, "Planner Institute").await;

    let new = |name: &str, start: i64, end: i64| NewAdmissionPeriod {
        name: name.to_string(),
        start_date: days_from_today(start),
        end_date: days_from_today(end),
    };

    let upcoming = lifecycle.create_period(inst.institute_id, &new("Spring", 30, 90)).await.unwrap();
    assert_eq!(upcoming.status, "upcoming");

    let active = lifecycle.create_period(inst.institute_id, &new("Now", 0, 20)).await.unwrap();
    assert_eq!(active.status, "active");

    // Start inside, end inside, and full containment all overlap.
    for (start, end) in [(60, 120), (25, 31), (21, 200)] {
        let err = lifecycle
            .create_period(inst.institute_id, &new("Clash", start, end))
            .await
            .unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Rejected(msg)) if msg.contains("overlaps"));
    }

    let err = lifecycle.create_period(inst.institute_id, &new("Past", -1, 10)).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Validation(msg)) if msg == "Start date cannot be in the past");

    let err = lifecycle.create_period(inst.institute_id, &new("Empty", 100, 100)).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Validation(msg)) if msg == "End date must be after start date");

    let err = lifecycle.create_period(inst.institute_id, &new("   ", 100, 110)).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Validation(_)));

    // Closed periods no longer block their window.
    lifecycle
        .update_period_status(inst.institute_id, upcoming.id, PeriodStatus::Closed)
        .await
        .unwrap();
    let replacement = lifecycle.create_period(inst.institute_id, &new("Spring again", 30, 90)).await.unwrap();
    assert_eq!(replacement.status, "upcoming");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn publish_promotes_started_upcoming_period(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let inst = seed_institute(&pool, "Publisher Institute").await;
    let started = seed_period(&pool, inst.institute_id, days_from_today(-2), days_from_today(30), "upcoming").await;
    let future = seed_period(&pool, inst.institute_id, days_from_today(40), days_from_today(80), "upcoming").await;

    let err = lifecycle.publish_period(inst.institute_id, future.id).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Core(CoreError::Rejected(msg)) if msg == "Cannot publish admission period before start date"
    );

    let published = lifecycle.publish_period(inst.institute_id, started.id).await.unwrap();
    assert_eq!(published.status, "active");

    let err = lifecycle.publish_period(inst.institute_id, started.id).await.unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::Rejected(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn at_most_one_active_period_per_institute(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let lifecycle = AdmissionLifecycle::new(&pool, &policy);
    let inst = seed_institute(&pool, "Single Institute").await;
    seed_period(&pool, inst.institute_id, days_from_today(-30), days_from_today(-1), "active").await;
    let later = seed_period(&pool, inst.institute_id, days_from_today(-2), days_from_today(60), "upcoming").await;

    let err = lifecycle.publish_period(inst.institute_id, later.id).await.unwrap_err();
    assert_matches!(
        err,
        AppError::Database(sqlx::Error::Database(db))
            if db.constraint() == Some("uq_admission_periods_one_active")
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Two racing submissions for the last slot: exactly one wins.
#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_submissions_cannot_exceed_quota(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let student = seed_student(&pool, "racer").await;
    let inst = seed_institute(&pool, "Race Institute").await;
    seed_period(&pool, inst.institute_id, days_from_today(-1), days_from_today(60), "active").await;
    let c1 = seed_course(&pool, inst.faculty_id, "RC-1", None).await;
    let c2 = seed_course(&pool, inst.faculty_id, "RC-2", None).await;
    let c3 = seed_course(&pool, inst.faculty_id, "RC-3", None).await;

    AdmissionLifecycle::new(&pool, &policy)
        .submit(student.student_id, &application(c1))
        .await
        .unwrap();

    let left = AdmissionLifecycle::new(&pool, &policy);
    let right = AdmissionLifecycle::new(&pool, &policy);
    let input2 = application(c2);
    let input3 = application(c3);
    let (r2, r3) = tokio::join!(
        left.submit(student.student_id, &input2),
        right.submit(student.student_id, &input3),
    );

    assert_eq!([r2.is_ok(), r3.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 2);
    assert_eq!(tracker.course_ids.len(), 2);
    assert_eq!(count_rows(&pool, "applications").await, 2);
}

/// Racing first submissions to an institute without a period open one
/// period between them.
#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_first_submissions_share_one_period(pool: PgPool) {
    let policy = AdmissionPolicy::default();
    let inst = seed_institute(&pool, "Fresh Institute").await;
    let course = seed_course(&pool, inst.faculty_id, "FR-1", None).await;
    let s1 = seed_student(&pool, "first-in").await;
    let s2 = seed_student(&pool, "second-in").await;

    let left = AdmissionLifecycle::new(&pool, &policy);
    let right = AdmissionLifecycle::new(&pool, &policy);
    let input = application(course);
    let (r1, r2) = tokio::join!(
        left.submit(s1.student_id, &input),
        right.submit(s2.student_id, &input),
    );

    let (r1, r2) = (r1.unwrap(), r2.unwrap());
    assert_eq!(r1.admission_period_id, r2.admission_period_id);
    assert_eq!(count_rows(&pool, "admission_periods").await, 1);

    let period = AdmissionPeriodRepo::find_by_id(&pool, r1.admission_period_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(period.total_applications, 2);
}

/// Run the withdrawal steps for `application_id` inside a transaction the
/// caller has to finish. Until then the application row and the tracker row
/// stay locked.
async fn begin_withdrawal(
    pool: &PgPool,
    student_id: DbId,
    institute_id: DbId,
    application_id: DbId,
    course_id: DbId,
) -> Transaction<'static, Postgres> {
    let mut tx = pool.begin().await.unwrap();
    ApplicationRepo::lock_for_student(&mut tx, application_id, student_id)
        .await
        .unwrap()
        .expect("application belongs to the student");
    ApplicationRepo::update_status(
        &mut tx,
        application_id,
        ApplicationStatus::Withdrawn,
        Some(NOTE_WITHDRAWN_BY_STUDENT),
    )
    .await
    .unwrap();
    let released = QuotaTracker::release(
        &mut tx,
        student_id,
        institute_id,
        academic_year(today()),
        course_id,
    )
    .await
    .unwrap();
    assert!(released);
    tx
}

/// Fill both slots of an institute for a fresh student.
async fn full_quota(pool: &PgPool, handle: &str) -> (TestStudent, TestInstitute, [DbId; 3], DbId) {
    let policy = AdmissionPolicy::default();
    let student = seed_student(pool, handle).await;
    let inst = seed_institute(pool, &format!("{handle} Institute")).await;
    seed_period(pool, inst.institute_id, days_from_today(-1), days_from_today(60), "active").await;
    let c1 = seed_course(pool, inst.faculty_id, &format!("{handle}-1"), None).await;
    let c2 = seed_course(pool, inst.faculty_id, &format!("{handle}-2"), None).await;
    let c3 = seed_course(pool, inst.faculty_id, &format!("{handle}-3"), None).await;

    let lifecycle = AdmissionLifecycle::new(pool, &policy);
    let first = lifecycle.submit(student.student_id, &application(c1)).await.unwrap();
    lifecycle.submit(student.student_id, &application(c2)).await.unwrap();
    (student, inst, [c1, c2, c3], first.application_id)
}

/// A third submission racing a withdrawal that ends up rolled back waits
/// for it and is then refused; the tracker never sees a third course.
#[sqlx::test(migrations = "../../db/migrations")]
async fn third_submission_waits_out_uncommitted_withdrawal(pool: PgPool) {
    let (student, inst, [c1, c2, c3], first) = full_quota(&pool, "waiter").await;

    let tx = begin_withdrawal(&pool, student.student_id, inst.institute_id, first, c1).await;

    let racer = {
        let pool = pool.clone();
        let student_id = student.student_id;
        tokio::spawn(async move {
            let policy = AdmissionPolicy::default();
            AdmissionLifecycle::new(&pool, &policy)
                .submit(student_id, &application(c3))
                .await
        })
    };

    // The tracker row is locked, so the submission cannot finish yet.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!racer.is_finished());

    tx.rollback().await.unwrap();

    let result = racer.await.unwrap();
    assert_matches!(
        result,
        Err(AppError::Core(CoreError::Rejected(msg))) if msg.contains("maximum 2 courses per institute")
    );

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count as usize, tracker.course_ids.len());
    assert_eq!(tracker.course_ids, vec![c1, c2]);
    assert_eq!(status_of(&pool, first).await, "pending");
    assert_eq!(count_rows(&pool, "applications").await, 2);
}

/// Once the racing withdrawal commits, the waiting submission takes the
/// freed slot and the tracker still holds exactly two courses.
#[sqlx::test(migrations = "../../db/migrations")]
async fn third_submission_takes_slot_freed_by_committed_withdrawal(pool: PgPool) {
    let (student, inst, [c1, c2, c3], first) = full_quota(&pool, "patient").await;

    let tx = begin_withdrawal(&pool, student.student_id, inst.institute_id, first, c1).await;

    let racer = {
        let pool = pool.clone();
        let student_id = student.student_id;
        tokio::spawn(async move {
            let policy = AdmissionPolicy::default();
            AdmissionLifecycle::new(&pool, &policy)
                .submit(student_id, &application(c3))
                .await
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!racer.is_finished());

    tx.commit().await.unwrap();

    let receipt = racer.await.unwrap().unwrap();
    assert_eq!(receipt.remaining_slots, 0);

    let tracker = tracker_for(&pool, student.student_id, inst.institute_id).await.unwrap();
    assert_eq!(tracker.application_count, 2);
    assert_eq!(tracker.application_count as usize, tracker.course_ids.len());
    assert_eq!(tracker.course_ids, vec![c2, c3]);
    assert_eq!(status_of(&pool, first).await, "withdrawn");
}
