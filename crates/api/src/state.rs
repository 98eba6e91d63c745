use std::sync::Arc;

use crate::config::ServerConfig;
use crate::lifecycle::AdmissionLifecycle;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: admissions_db::DbPool,
    /// Server configuration (JWT secret, admission policy).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// The admission lifecycle manager bound to this state's pool and policy.
    pub fn lifecycle(&self) -> AdmissionLifecycle<'_> {
        AdmissionLifecycle::new(&self.pool, &self.config.admission)
    }
}
