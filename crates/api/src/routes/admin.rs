//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET /stats           -> system_stats
/// GET /applications    -> list_applications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::system_stats))
        .route("/applications", get(admin::list_applications))
}
