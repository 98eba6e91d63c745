//! Handlers for the `/admission/periods` resource (institute only).

use admissions_core::admission_period::PeriodStatus;
use admissions_core::types::{Date, DbId};
use admissions_db::repositories::AdmissionPeriodRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::lifecycle::NewAdmissionPeriod;
use crate::middleware::rbac::RequireInstitute;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /admission/periods`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePeriodRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Request body for `PUT /admission/periods/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdatePeriodRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodListQuery {
    pub status: Option<String>,
}

/// GET /api/v1/admission/periods
pub async fn list_periods(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PeriodListQuery>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<PeriodStatus>)
        .transpose()?;
    let periods =
        AdmissionPeriodRepo::list_for_institute(&state.pool, caller.profile_id, status).await?;
    Ok(Json(ApiResponse::data(periods)))
}

/// POST /api/v1/admission/periods
pub async fn create_period(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreatePeriodRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let period = state
        .lifecycle()
        .create_period(
            caller.profile_id,
            &NewAdmissionPeriod {
                name: input.name,
                start_date: input.start_date,
                end_date: input.end_date,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Admission period created successfully",
            period,
        )),
    ))
}

/// PUT /api/v1/admission/periods/{id}
///
/// Status change; moving to `closed` rejects every pending application of
/// the period.
pub async fn update_period(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppPath(period_id): AppPath<DbId>,
    AppJson(input): AppJson<UpdatePeriodRequest>,
) -> AppResult<impl IntoResponse> {
    let next: PeriodStatus = input.status.parse()?;
    let change = state
        .lifecycle()
        .update_period_status(caller.profile_id, period_id, next)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Admission period updated successfully",
        change,
    )))
}

/// PUT /api/v1/admission/periods/{id}/publish
pub async fn publish_period(
    RequireInstitute(caller): RequireInstitute,
    State(state): State<AppState>,
    AppPath(period_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let period = state
        .lifecycle()
        .publish_period(caller.profile_id, period_id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Admissions published successfully",
        period,
    )))
}
