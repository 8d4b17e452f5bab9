use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::ApiResponse;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Only POST method allowed")]
    InvalidMethod,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("Image file is required")]
    MissingImage,
    #[error("Unsupported format. Supported: {}", .supported.join(", "))]
    UnsupportedFormat { supported: Vec<String> },
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Prediction(String),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        // Callers only ever see 400; upstream failures are not told apart.
        let status = StatusCode::BAD_REQUEST;
        let message = self.to_string();
        tracing::warn!(error = %message, "request failed");

        (status, axum::Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
