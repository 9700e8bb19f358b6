//! HTTP error mapping
//!
//! Every failure is answered as `{"detail": "..."}` with the status the error
//! taxonomy assigns to it.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitch_engine::secrets::scrub;
use sdk::{PitchError, PitchErrorExt};
use serde_json::json;

/// Wrapper turning [`PitchError`] into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub PitchError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Caller-facing message
    pub fn detail(&self) -> String {
        match &self.0 {
            // Surface the missing variable without the category prefix
            PitchError::Config(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<PitchError> for ApiError {
    fn from(error: PitchError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PitchError::Validation(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(PitchError::Validation(rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        Self(PitchError::Validation(format!("Malformed upload: {}", error.body_text())))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), hint = self.0.user_hint(), "{}", scrub(&detail));
        } else {
            tracing::debug!(status = status.as_u16(), "{}", scrub(&detail));
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
