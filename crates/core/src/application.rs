//! Application status state machine and submission/review validation.
//!
//! The five application statuses form a small state machine:
//!
//! ```text
//! pending      -> under_review, accepted, rejected, withdrawn
//! under_review -> accepted, rejected
//! accepted, rejected, withdrawn  (terminal)
//! ```
//!
//! Every status change in the lifecycle manager goes through
//! [`ApplicationStatus::validate_transition`]; transitions not listed in the
//! table are refused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Minimum length of a personal statement, in characters.
pub const MIN_PERSONAL_STATEMENT_LENGTH: u64 = 50;

/// Maximum length of the optional preferred major.
pub const MAX_PREFERRED_MAJOR_LENGTH: u64 = 255;

/// Maximum length of institute review notes.
pub const MAX_REVIEW_NOTES_LENGTH: u64 = 1_000;

/// Review note written on applications rejected because the student was
/// accepted elsewhere.
pub const NOTE_AUTO_REJECTED_ACCEPTED_ELSEWHERE: &str =
    "Automatically rejected: Student accepted at another institute";

/// Review note written on pending applications when their admission period closes.
pub const NOTE_AUTO_REJECTED_PERIOD_CLOSED: &str = "Application rejected: Admission period closed";

/// Review note written when a student withdraws an application.
pub const NOTE_WITHDRAWN_BY_STUDENT: &str = "Withdrawn by student";

/* --------------------------------------------------------------------------
Status
-------------------------------------------------------------------------- */

/// Lifecycle status of an application row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    /// The database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Statuses reachable from `self` in a single transition.
    pub fn valid_transitions(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[UnderReview, Accepted, Rejected, Withdrawn],
            UnderReview => &[Accepted, Rejected],
            Accepted | Rejected | Withdrawn => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Check a transition against the table, refusing anything not listed.
    pub fn validate_transition(self, next: ApplicationStatus) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::Rejected(format!(
                "Cannot change application status from '{self}' to '{next}'"
            )))
        }
    }

    /// Statuses an institute may set through the review endpoint.
    ///
    /// `withdrawn` belongs to the student and `pending` is only ever the
    /// initial state.
    pub fn is_review_target(self) -> bool {
        matches!(
            self,
            ApplicationStatus::UnderReview | ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid application status '{s}'. Must be one of: pending, under_review, \
                     accepted, rejected, withdrawn"
                ))
            })
    }
}

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate the target status of an institute review.
pub fn validate_review_target(status: ApplicationStatus) -> Result<(), CoreError> {
    if status.is_review_target() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Status '{status}' cannot be set by an institute. Must be one of: under_review, \
             accepted, rejected"
        )))
    }
}

/// Validate the length of a personal statement, counted in characters.
pub fn validate_personal_statement(statement: &str) -> Result<(), CoreError> {
    let len = statement.trim().chars().count() as u64;
    if len < MIN_PERSONAL_STATEMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Personal statement must be at least {MIN_PERSONAL_STATEMENT_LENGTH} characters \
             (got {len})"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
