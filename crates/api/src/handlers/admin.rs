//! Handlers for the `/admin` resource.

use admissions_core::application::ApplicationStatus;
use admissions_core::types::DbId;
use admissions_db::models::application::{AdminApplicationFilter, AdminApplicationView};
use admissions_db::repositories::{ApplicationRepo, StatsRepo};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{PageParams, Pagination};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Query string for `GET /admin/applications`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminApplicationQuery {
    pub status: Option<String>,
    #[serde(alias = "instituteId")]
    pub institute_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AdminApplicationPage {
    pub applications: Vec<AdminApplicationView>,
    pub pagination: Pagination,
}

/// GET /api/v1/admin/stats
pub async fn system_stats(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = StatsRepo::system_stats(&state.pool).await?;
    tracing::debug!(user_id = admin.user_id, "System stats requested");
    Ok(Json(ApiResponse::data(stats)))
}

/// GET /api/v1/admin/applications
///
/// Every application across institutes with student, course, institute and
/// period names. Filterable by `status` and `institute_id`.
pub async fn list_applications(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdminApplicationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, limit, offset) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve();
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ApplicationStatus>)
        .transpose()?;
    let filter = AdminApplicationFilter {
        status: status.map(|s| s.as_str().to_string()),
        institute_id: params.institute_id,
    };

    let applications =
        ApplicationRepo::list_views_for_admin(&state.pool, &filter, limit, offset).await?;
    let total = ApplicationRepo::count_for_admin(&state.pool, &filter).await?;

    Ok(Json(ApiResponse::data(AdminApplicationPage {
        applications,
        pagination: Pagination::new(page, limit, total),
    })))
}
