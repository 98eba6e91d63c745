//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`], rejects callers whose role does not
//! match with 403, and for the profile-bound roles resolves the caller's
//! student or institute profile id.

use admissions_core::error::CoreError;
use admissions_core::roles::{ROLE_ADMIN, ROLE_INSTITUTE, ROLE_STUDENT};
use admissions_core::types::DbId;
use admissions_db::repositories::{InstituteRepo, StudentRepo};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated caller together with their role-specific profile id.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: DbId,
    pub role: String,
    /// `students.id` or `institutes.id`, depending on the role.
    pub profile_id: DbId,
}

/// Requires the `student` role and an existing student profile.
///
/// ```ignore
/// async fn apply(RequireStudent(caller): RequireStudent) -> AppResult<Json<()>> {
///     let student_id = caller.profile_id;
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStudent(pub Caller);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_role(parts, state, ROLE_STUDENT, "Student role required").await?;
        let profile_id = StudentRepo::find_id_by_user(&state.pool, user.user_id)
            .await?
            .ok_or_else(|| missing_profile("Student"))?;
        Ok(RequireStudent(Caller {
            user_id: user.user_id,
            role: user.role,
            profile_id,
        }))
    }
}

/// Requires the `institute` role and an existing institute profile.
pub struct RequireInstitute(pub Caller);

impl FromRequestParts<AppState> for RequireInstitute {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_role(parts, state, ROLE_INSTITUTE, "Institute role required").await?;
        let profile_id = InstituteRepo::find_id_by_user(&state.pool, user.user_id)
            .await?
            .ok_or_else(|| missing_profile("Institute"))?;
        Ok(RequireInstitute(Caller {
            user_id: user.user_id,
            role: user.role,
            profile_id,
        }))
    }
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_role(parts, state, ROLE_ADMIN, "Admin role required").await?;
        Ok(RequireAdmin(user))
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    role: &str,
    denial: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if user.role != role {
        return Err(AppError::Core(CoreError::Forbidden(denial.into())));
    }
    Ok(user)
}

fn missing_profile(kind: &str) -> AppError {
    AppError::Core(CoreError::Validation(format!(
        "{kind} profile not found. Please complete your profile."
    )))
}
