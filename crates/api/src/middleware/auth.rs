//! Caller identity extractor for Axum handlers.

use admissions_core::error::CoreError;
use admissions_core::types::DbId;
use admissions_db::repositories::UserRepo;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying a raw user id when header identity is enabled.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller.
///
/// Normally built from a JWT Bearer token in the `Authorization` header.
/// When `ALLOW_HEADER_IDENTITY` is on and no Authorization header is sent,
/// the `X-User-Id` header is trusted instead. Either way the user row must
/// exist and be active, and the role is read from it.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// The user's account type (`student`, `institute`, `admin`).
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());

        let Some(auth_header) = auth_header else {
            if state.config.allow_header_identity {
                if let Some(raw) = parts.headers.get(USER_ID_HEADER) {
                    return from_user_id_header(raw.to_str().unwrap_or_default(), state).await;
                }
            }
            return Err(unauthorized("Missing Authorization header"));
        };

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        active_user(claims.sub, state).await
    }
}

async fn from_user_id_header(raw: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let user_id: DbId = raw
        .trim()
        .parse()
        .map_err(|_| unauthorized("Invalid X-User-Id header"))?;

    active_user(user_id, state).await
}

/// Load the caller's account; deactivated or deleted accounts lose access
/// immediately, even with an unexpired token.
async fn active_user(user_id: DbId, state: &AppState) -> Result<AuthUser, AppError> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| unauthorized("Unknown or inactive user"))?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.user_type,
    })
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}
