//! HTTP error responses.
//!
//! Every failure surfaces as `{"error": "..."}` with a status that tells
//! the client whether it can fix the request (400) or has to wait for the
//! operator (500).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use mnist_draw::MnistDrawError;

/// An error ready to be rendered as a JSON response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<MnistDrawError> for ApiError {
    fn from(err: MnistDrawError) -> Self {
        match err {
            MnistDrawError::EmptyCanvas | MnistDrawError::InvalidImage(_) => {
                Self::bad_request(err.to_string())
            }
            MnistDrawError::ModelNotReady(_) => Self::internal("model not ready".to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
