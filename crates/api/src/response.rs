//! Shared response envelope for API handlers.
//!
//! Every successful response is `{ "success": true, "message"?: ..., "data"?: ... }`.
//! Error bodies use the same shape with `success: false`; see
//! [`crate::error::AppError`].

use serde::Serialize;

/// Standard success envelope.
///
/// ```ignore
/// Ok(Json(ApiResponse::data(items)))
/// Ok(Json(ApiResponse::with_message("Application submitted successfully", receipt)))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}
