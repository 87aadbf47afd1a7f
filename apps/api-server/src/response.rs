//! # Response Envelope
//!
//! Every endpoint answers with the same JSON shape:
//!
//! ```json
//! {
//!   "statusCode": 201,
//!   "data": { "id": "...", "quantity": 3 },
//!   "message": "Order item added",
//!   "success": true
//! }
//! ```
//!
//! Errors use the same envelope with `data: null` and `success: false`
//! (see [`crate::error::ApiError`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            status_code: status.as_u16(),
            success: status.is_success(),
            data,
            message: message.into(),
        }
    }

    /// 200 OK.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        ApiResponse::new(StatusCode::OK, data, message)
    }

    /// 201 Created.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        ApiResponse::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_names() {
        let body = serde_json::to_value(ApiResponse::created(7, "Created")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "statusCode": 201,
                "data": 7,
                "message": "Created",
                "success": true
            })
        );
    }
}
