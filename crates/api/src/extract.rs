//! Request extractors that answer decoding failures with the API error
//! envelope.
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain-text bodies (and
//! 422 for JSON that parses but does not fit the target type). These
//! wrappers turn every such rejection into an [`AppError`], so a missing
//! field or a non-numeric id becomes a 400 `VALIDATION_ERROR` naming the
//! offending field.
//!
//! ```ignore
//! async fn handler(
//!     AppPath(id): AppPath<DbId>,
//!     AppJson(input): AppJson<ApplyRequest>,
//! ) -> AppResult<Json<()>> { ... }
//! ```

use axum::extract::path::ErrorKind;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| AppJson(value))
            .map_err(json_rejection)
    }
}

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| AppPath(value))
            .map_err(path_rejection)
    }
}

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| AppQuery(value))
            .map_err(query_rejection)
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match &rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            decode_error(&rejection.body_text(), "body")
        }
        JsonRejection::MissingJsonContentType(_) => AppError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ),
        _ => AppError::BadRequest(rejection.body_text()),
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    decode_error(&rejection.body_text(), "query")
}

fn path_rejection(rejection: PathRejection) -> AppError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
            ErrorKind::ParseErrorAtKey {
                key, expected_type, ..
            } => AppError::InvalidInput {
                field: key.clone(),
                message: format!("Expected a valid {expected_type}"),
            },
            ErrorKind::ParseError { expected_type, .. }
            | ErrorKind::ParseErrorAtIndex { expected_type, .. } => AppError::InvalidInput {
                field: "path".to_string(),
                message: format!("Expected a valid {expected_type}"),
            },
            _ => AppError::InvalidInput {
                field: "path".to_string(),
                message: err.body_text(),
            },
        },
        other => AppError::InternalError(other.body_text()),
    }
}

fn decode_error(text: &str, fallback_field: &str) -> AppError {
    let (field, message) = describe_decode_error(text, fallback_field);
    AppError::InvalidInput { field, message }
}

/// Split a serde decoding message into `(field, message)`.
///
/// Rejection texts look like `<what failed>: [<path>: ]<serde error>[ at line L column C]`.
fn describe_decode_error(text: &str, fallback_field: &str) -> (String, String) {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail.split(" at line ").next().unwrap_or(detail).trim();

    if let Some((_, rest)) = detail.split_once("missing field `") {
        if let Some((name, _)) = rest.split_once('`') {
            return (name.to_string(), format!("{name} is required"));
        }
    }

    match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => {
            (path.to_string(), message.to_string())
        }
        _ => (fallback_field.to_string(), detail.to_string()),
    }
}
