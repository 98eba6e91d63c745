//! Admission period status rules and window validation.
//!
//! Periods move `upcoming -> active -> closed`; an upcoming period may also
//! be closed directly. `closed` is terminal for institute-driven updates.
//! The submission-time resolver is the one exception: it may force any
//! existing period back to `active` when auto-opening is enabled.

use std::fmt;
use std::str::FromStr;

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Date;

/// Name given to periods synthesised by the submission-time resolver.
pub const PLACEHOLDER_PERIOD_NAME: &str = "Auto-Created Admissions";

/// Length of a synthesised period, in months.
pub const PLACEHOLDER_PERIOD_MONTHS: u32 = 12;

/// Maximum length of a period name.
pub const MAX_PERIOD_NAME_LENGTH: u64 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Upcoming,
    Active,
    Closed,
}

impl PeriodStatus {
    pub const ALL: [PeriodStatus; 3] = [PeriodStatus::Upcoming, PeriodStatus::Active, PeriodStatus::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodStatus::Upcoming => "upcoming",
            PeriodStatus::Active => "active",
            PeriodStatus::Closed => "closed",
        }
    }

    /// Statuses reachable from `self` through an institute update.
    pub fn valid_transitions(self) -> &'static [PeriodStatus] {
        match self {
            PeriodStatus::Upcoming => &[PeriodStatus::Active, PeriodStatus::Closed],
            PeriodStatus::Active => &[PeriodStatus::Closed],
            PeriodStatus::Closed => &[],
        }
    }

    pub fn validate_transition(self, next: PeriodStatus) -> Result<(), CoreError> {
        if self.valid_transitions().contains(&next) {
            Ok(())
        } else {
            Err(CoreError::Rejected(format!(
                "Cannot change admission period status from '{self}' to '{next}'"
            )))
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeriodStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid admission period status '{s}'. Must be one of: upcoming, active, closed"
                ))
            })
    }
}

/// A closed date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Date,
    pub end: Date,
}

impl Window {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }

    /// Overlap test used when creating a period: either boundary of `self`
    /// falls inside `other`, or `self` fully contains `other`.
    pub fn overlaps(&self, other: &Window) -> bool {
        other.contains(self.start)
            || other.contains(self.end)
            || (self.start <= other.start && self.end >= other.end)
    }

    /// The window of a period synthesised on `today`.
    pub fn placeholder(today: Date) -> Self {
        let end = today
            .checked_add_months(Months::new(PLACEHOLDER_PERIOD_MONTHS))
            .unwrap_or(Date::MAX);
        Self { start: today, end }
    }
}

/// Validate a new admission window against `today`.
pub fn validate_new_window(window: &Window, today: Date) -> Result<(), CoreError> {
    if window.start >= window.end {
        return Err(CoreError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    if window.start < today {
        return Err(CoreError::Validation(
            "Start date cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

/// Initial status of a newly created period.
pub fn initial_status(window: &Window, today: Date) -> PeriodStatus {
    if window.contains(today) {
        PeriodStatus::Active
    } else {
        PeriodStatus::Upcoming
    }
}

/// Publishing promotes an upcoming period once its start date is reached.
pub fn validate_publish(status: PeriodStatus, start: Date, today: Date) -> Result<(), CoreError> {
    if status != PeriodStatus::Upcoming {
        return Err(CoreError::Rejected(
            "Only upcoming admission periods can be published".to_string(),
        ));
    }
    if start > today {
        return Err(CoreError::Rejected(
            "Cannot publish admission period before start date".to_string(),
        ));
    }
    Ok(())
}
