//! Mapping from the core error taxonomy to HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use wikihop_core::Error;

/// An error rendered as the JSON envelope `{error, message, code}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl ApiError {
    /// A 400 with code `VALIDATION_ERROR`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR".to_owned(),
            message: message.into(),
        }
    }

    /// Maps a body-extraction rejection: wrong content type gets its own
    /// code, everything else is a validation failure.
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        let code = match &rejection {
            JsonRejection::MissingJsonContentType(_) => "INVALID_CONTENT_TYPE",
            _ => "VALIDATION_ERROR",
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            code: code.to_owned(),
            message: rejection.body_text(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidPage(_) => StatusCode::BAD_REQUEST,
            Error::PathNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream(_) | Error::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::SoftTimeout
            | Error::AttemptTimeout(_)
            | Error::RetriesExhausted(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.code().to_owned(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "message": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
