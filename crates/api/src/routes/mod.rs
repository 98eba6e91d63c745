pub mod admin;
pub mod admission;
pub mod applications;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                                  login (public)
///
/// /applications/apply                          submit (student)
/// /applications/student                        own applications (student)
/// /applications/quota/{institute_id}           remaining slots (student)
/// /applications/{id}/withdraw                  withdraw (student, DELETE)
/// /applications/institute                      list received (institute)
/// /applications/{id}/status                    review (institute, PUT)
///
/// /admission/periods                           list, create (institute)
/// /admission/periods/{id}                      status change (institute, PUT)
/// /admission/periods/{id}/publish              publish (institute, PUT)
///
/// /admin/stats                                 system counts (admin)
/// /admin/applications                          all applications (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/applications", applications::router())
        .nest("/admission", admission::router())
        .nest("/admin", admin::router())
}
