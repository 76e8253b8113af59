use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// Maps the crate error taxonomy onto HTTP statuses and `{message, error?}` bodies.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Auth => StatusCode::UNAUTHORIZED,
            Error::Storage(_) | Error::FileSystem { .. } | Error::Hashing(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.0 {
            Error::Auth => json!({ "message": "Invalid credentials." }),
            Error::Validation(m) | Error::Conflict(m) | Error::NotFound(m) => json!({ "message": m }),
            other => {
                error!(error = %other, "request failed");
                json!({
                    "message": "Internal server error.",
                    "error": other.to_string(),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
