//! Admission lifecycle manager.
//!
//! Every operation here runs as one database transaction: the rows it reads
//! and then writes are locked with `SELECT ... FOR UPDATE`, and a returned
//! error drops the transaction, rolling back everything including any
//! admission period the resolver opened on the way.
//!
//! - [`resolver`] -- picks (or opens) the admission period a submission joins.
//! - [`quota`] -- per-institute application quota on top of the tracker table.
//! - [`applications`] -- submit, review status changes, withdrawal.
//! - [`periods`] -- period creation, status changes with close cascade, publish.

pub mod applications;
pub mod periods;
pub mod quota;
pub mod resolver;

use admissions_core::types::Date;
use sqlx::PgPool;

use crate::config::AdmissionPolicy;

pub use applications::{NewApplication, StatusChange, SubmissionReceipt};
pub use periods::{NewAdmissionPeriod, PeriodChange};
pub use quota::QuotaTracker;

/// Orchestrates the multi-row writes of the admission workflow.
///
/// Cheap to build; handlers obtain one per request via
/// [`AppState::lifecycle`](crate::state::AppState::lifecycle).
pub struct AdmissionLifecycle<'a> {
    pool: &'a PgPool,
    policy: &'a AdmissionPolicy,
}

impl<'a> AdmissionLifecycle<'a> {
    pub fn new(pool: &'a PgPool, policy: &'a AdmissionPolicy) -> Self {
        Self { pool, policy }
    }

    /// The calendar day the lifecycle rules are evaluated against (UTC).
    fn today(&self) -> Date {
        chrono::Utc::now().date_naive()
    }
}
