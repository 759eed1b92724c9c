use crate::engine::EngineError;
use crate::recorder::RecorderError;
use attend_core::DecodeError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failures reported to HTTP clients. Display strings are the user-facing
/// messages; the underlying cause is logged where the error is converted.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid image format")]
    InvalidFormat,
    #[error("Image decoding failed")]
    DecodeFailed,
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Analysis failed")]
    AnalysisFailed,
    #[error("Failed to access log")]
    LogUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFormat | ApiError::DecodeFailed => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::AnalysisFailed | ApiError::LogUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            status: "error",
            message: self.to_string(),
        };
        (self.status(), Json(envelope)).into_response()
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidFormat => ApiError::InvalidFormat,
            other => {
                tracing::warn!(error = %other, "frame decoding failed");
                ApiError::DecodeFailed
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, status = %rejection.status(), "rejected request body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidFormat
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        tracing::error!(error = %err, "frame analysis failed");
        ApiError::AnalysisFailed
    }
}

impl From<RecorderError> for ApiError {
    fn from(err: RecorderError) -> Self {
        tracing::error!(error = %err, "emotion log unavailable");
        ApiError::LogUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidFormat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DecodeFailed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::AnalysisFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::LogUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_decode_error_mapping() {
        assert!(matches!(ApiError::from(DecodeError::InvalidFormat), ApiError::InvalidFormat));
        let corrupt = base64_error();
        assert!(matches!(ApiError::from(corrupt), ApiError::DecodeFailed));
    }

    fn base64_error() -> DecodeError {
        attend_core::decode_data_url("data:image/png;base64,%%%").unwrap_err()
    }
}
