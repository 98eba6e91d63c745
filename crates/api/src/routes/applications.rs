//! Route definitions for the `/applications` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::applications;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// POST   /apply                   -> apply
/// GET    /student                 -> list_for_student
/// GET    /institute               -> list_for_institute
/// GET    /quota/{institute_id}    -> quota
/// PUT    /{id}/status             -> update_status
/// DELETE /{id}/withdraw           -> withdraw
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apply", post(applications::apply))
        .route("/student", get(applications::list_for_student))
        .route("/institute", get(applications::list_for_institute))
        .route("/quota/{institute_id}", get(applications::quota))
        .route("/{id}/status", put(applications::update_status))
        .route("/{id}/withdraw", delete(applications::withdraw))
}
