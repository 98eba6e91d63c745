//! Route definitions for the `/admission` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admission;
use crate::state::AppState;

/// Routes mounted at `/admission`.
///
/// ```text
/// GET  /periods                 -> list_periods
/// POST /periods                 -> create_period
/// PUT  /periods/{id}            -> update_period
/// PUT  /periods/{id}/publish    -> publish_period
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/periods",
            get(admission::list_periods).post(admission::create_period),
        )
        .route("/periods/{id}", put(admission::update_period))
        .route("/periods/{id}/publish", put(admission::publish_period))
}
