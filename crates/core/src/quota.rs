//! Per-institute application quota arithmetic.
//!
//! A student may hold at most [`MAX_APPLICATIONS_PER_INSTITUTE`] applications
//! to distinct courses of one institute per academic year. The tracker row
//! stores a count and the set of applied course ids; the two must always
//! agree. Everything here is pure so the repository layer only has to
//! persist the result.

use chrono::Datelike;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{Date, DbId};

/// Applications allowed per (student, institute, academic year).
pub const MAX_APPLICATIONS_PER_INSTITUTE: i32 = 2;

/// The academic year key used to bucket quotas: the calendar year.
pub fn academic_year(day: Date) -> i32 {
    day.year()
}

/// Result of a `canApply` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub can_apply: bool,
    pub remaining_slots: i32,
    pub current_count: i32,
    pub applied_course_ids: Vec<DbId>,
}

impl QuotaStatus {
    /// Status for a student with no tracker row yet.
    pub fn fresh() -> Self {
        Self::from_courses(Vec::new())
    }

    /// Derive the status from the applied course set.
    pub fn from_courses(applied_course_ids: Vec<DbId>) -> Self {
        let current_count = applied_course_ids.len() as i32;
        let remaining_slots = (MAX_APPLICATIONS_PER_INSTITUTE - current_count).max(0);
        Self {
            can_apply: current_count < MAX_APPLICATIONS_PER_INSTITUTE,
            remaining_slots,
            current_count,
            applied_course_ids,
        }
    }

    /// Refuse when no slot remains.
    pub fn ensure_can_apply(&self) -> Result<(), CoreError> {
        if self.can_apply {
            Ok(())
        } else {
            Err(CoreError::Rejected(format!(
                "You can only apply to maximum {MAX_APPLICATIONS_PER_INSTITUTE} courses per \
                 institute. You have already applied to {} courses.",
                self.current_count
            )))
        }
    }
}

/// Add `course_id` to the set.
///
/// Returns `None` when the course is already tracked (retried requests must
/// not double count). Returns an error when the addition would exceed the
/// quota.
pub fn track(course_ids: &[DbId], course_id: DbId) -> Result<Option<Vec<DbId>>, CoreError> {
    if course_ids.contains(&course_id) {
        return Ok(None);
    }
    QuotaStatus::from_courses(course_ids.to_vec()).ensure_can_apply()?;
    let mut next = course_ids.to_vec();
    next.push(course_id);
    Ok(Some(next))
}

/// Remove `course_id` from the set.
///
/// Returns `None` when the course is not tracked, i.e. it was already
/// released.
pub fn release(course_ids: &[DbId], course_id: DbId) -> Option<Vec<DbId>> {
    if !course_ids.contains(&course_id) {
        return None;
    }
    Some(course_ids.iter().copied().filter(|&id| id != course_id).collect())
}
