//! Handlers for the `/applications` resource.
//!
//! Students submit, list and withdraw their own applications; institutes
//! list and review applications to their courses. The multi-row writes go
//! through [`AdmissionLifecycle`](crate::lifecycle::AdmissionLifecycle).

use admissions_core::application::ApplicationStatus;
use admissions_core::types::DbId;
use admissions_db::models::application::{InstituteApplicationFilter, InstituteApplicationView};
use admissions_db::repositories::ApplicationRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::lifecycle::NewApplication;
use crate::middleware::rbac::{RequireInstitute, RequireStudent};
use crate::query::{PageParams, Pagination};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /applications/apply`.
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(range(min = 1, message = "Valid course ID is required"))]
    pub course_id: DbId,
    #[validate(length(max = 255, message = "Preferred major must be at most 255 characters"))]
    pub preferred_major: Option<String>,
    #[validate(length(min = 50, message = "Personal statement must be at least 50 characters"))]
    pub personal_statement: String,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// Request body for `PUT /applications/{id}/status`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    /// One of `under_review`, `accepted`, `rejected`.
    pub status: String,
    #[validate(length(max = 1000, message = "Review notes must be at most 1000 characters"))]
    pub review_notes: Option<String>,
}

/// Query string for `GET /applications/institute`.
#[derive(Debug, Default, Deserialize)]
pub struct InstituteListQuery {
    pub status: Option<String>,
    pub course_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InstituteApplicationPage {
    pub applications: Vec<InstituteApplicationView>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Student handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/applications/apply
pub async fn apply(
    RequireStudent(caller): RequireStudent,
    State(state): State<AppState>,
    AppJson(input): AppJson<ApplyRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let receipt = state
        .lifecycle()
        .submit(
            caller.profile_id,
            &NewApplication {
                course_id: input.course_id,
                preferred_major: input.preferred_major,
                personal_statement: input.personal_statement,
                documents: input.documents,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Application submitted successfully",
            receipt,
        )),
    ))
}

/// GET /api/v1/applications/student
///
/// The caller's applications, newest first.
pub async fn list_for_student(
    RequireStudent(caller): RequireStudent,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let applications = ApplicationRepo::list_views_for_student(&state.pool, caller.profile_id).await?;
    Ok(Json(ApiResponse::data(applications)))
}

/// GET /api/v1/applications/quota/{institute_id}
pub async fn quota(
    RequireStudent(caller): RequireStudent,
    State(state): State<AppState>,
    AppPath(institute_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state
        .lifecycle()
        .can_apply(caller.profile_id, institute_id)
        .await?;
    Ok(Json(ApiResponse::data(status)))
}

/// DELETE /api/v1/applications/{id}/withdraw
pub async fn withdraw(
    RequireStudent(caller): RequireStudent,
    State(state): State<AppState>,
    AppPath(application_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let application = state
        .lifecycle()
        .withdraw(caller.profile_id, application_id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Application withdrawn successfully",
        application,
    )))
}

// ---------------------------------------------------------------------------
// Institute handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/applications/institute
///
/// Applications to the caller's courses, filterable by `status` and
/// `course_id`, paginated with `page` / `limit`.
pub async fn list_for_institute(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<InstituteListQuery>,
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
    let filter = InstituteApplicationFilter {
        status: status.map(|s| s.as_str().to_string()),
        course_id: params.course_id,
    };

    let applications = ApplicationRepo::list_views_for_institute(
        &state.pool,
        caller.profile_id,
        &filter,
        limit,
        offset,
    )
    .await?;
    let total = ApplicationRepo::count_for_institute(&state.pool, caller.profile_id, &filter).await?;

    Ok(Json(ApiResponse::data(InstituteApplicationPage {
        applications,
        pagination: Pagination::new(page, limit, total),
    })))
}

/// PUT /api/v1/applications/{id}/status
pub async fn update_status(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppPath(application_id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let next: ApplicationStatus = input.status.parse()?;

    let change = state
        .lifecycle()
        .update_status(
            caller.profile_id,
            application_id,
            next,
            input.review_notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        format!("Application status updated to {next}"),
        change,
    )))
}
