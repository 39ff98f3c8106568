//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP
//! responses. All errors implement `IntoResponse` to provide consistent
//! error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Every failure a request can hit is represented here and converted to an
/// HTTP status plus JSON body via `IntoResponse`. Converter failures carry
/// internal detail (stderr, exit codes) in their Display form; that detail
/// is logged but never sent to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// API key missing or does not match the configured secret
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// Multipart body carried no usable file field
    #[error("Missing file field: {0}")]
    MissingFile(String),

    /// Multipart body could not be read
    #[error("Invalid multipart payload: {0}")]
    InvalidMultipart(String),

    /// Uploaded payload had zero bytes
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// Base64 payload could not be decoded
    #[error("Invalid base64 content")]
    InvalidBase64,

    /// Payload exceeds the configured maximum size
    #[error("File exceeds the maximum allowed size ({limit} bytes)")]
    PayloadTooLarge {
        /// Configured maximum in bytes
        limit: usize,
    },

    /// Conversion ran but produced no usable text
    #[error("Conversion produced no extractable text")]
    EmptyConversion,

    /// Conversion tooling failed
    #[error("Conversion error: {0}")]
    Conversion(#[from] crate::converter::ConvertError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::MissingFile(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidMultipart(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::EmptyFile => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidBase64 => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::EmptyConversion => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Conversion(ref e) => {
                // Exit codes and stderr stay in the logs
                tracing::error!(error = %e, "Document conversion failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to convert document".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConvertError;

    fn status_of(error: AppError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::MissingFile("file".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::EmptyFile), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::InvalidBase64), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::PayloadTooLarge { limit: 5 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(AppError::EmptyConversion),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::Conversion(ConvertError::ProcessFailed(
                "pandoc exited with code 1".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_conversion_error_body_is_generic() {
        let error = AppError::Conversion(ConvertError::ProcessFailed(
            "pandoc exited with code 64: secret internal detail".to_string(),
        ));
        let response = error.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to convert document");
        assert_eq!(json["status"], 500);
        assert!(!body.is_empty());
        assert!(!String::from_utf8_lossy(&body).contains("secret internal detail"));
    }
}
