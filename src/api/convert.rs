//! Conversion API handlers
//!
//! `POST /convert` accepts a multipart file upload; `POST /convert-base64`
//! accepts the same payload base64-encoded in a JSON body. Both run the same
//! linear pipeline: auth, empty check, size check, delegate to the
//! converter, reject empty results.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Multipart field name carrying the upload
const FILE_FIELD: &str = "file";

/// Content type assumed when the upload does not declare one
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Successful conversion response
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Filename as declared by the caller
    pub filename: String,
    /// MIME type as declared by the caller
    pub content_type: String,
    /// Uploaded payload size in bytes
    pub size_bytes: usize,
    /// The resulting Markdown text
    pub markdown: String,
}

/// Request body for `POST /convert-base64`
#[derive(Debug, Deserialize)]
pub struct Base64ConvertRequest {
    /// Filename as declared by the caller
    pub filename: String,
    /// MIME type as declared by the caller
    pub mimetype: String,
    /// Base64-encoded file content, optionally with a data-URL prefix
    pub base64_content: String,
}

/// Map a multipart read failure to an application error.
///
/// The router's body limit sits above the configured maximum, so the
/// handler's own size check normally decides the 413 — but an upload large
/// enough to trip the body limit fails inside multipart reading instead,
/// and must still surface as 413 rather than a generic 400.
fn multipart_error(error: MultipartError, limit: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::InvalidMultipart(error.to_string())
    }
}

/// Check the `X-API-Key` header against the configured secret.
///
/// When no key is configured, authentication is disabled and every request
/// passes. Comparison is an exact string match.
fn check_api_key(headers: &HeaderMap, state: &AppState) -> Result<(), AppError> {
    let Some(expected) = &state.config.auth.api_key else {
        return Ok(());
    };
    let supplied = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if supplied == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// The shared pipeline behind both endpoints: size gates, delegation to the
/// converter, and the empty-result post-condition. Auth has already passed
/// by the time this runs.
async fn convert_payload(
    state: &AppState,
    bytes: &[u8],
    filename: &str,
    content_type: &str,
) -> Result<ConvertResponse, AppError> {
    if bytes.is_empty() {
        return Err(AppError::EmptyFile);
    }

    let limit = state.config.limits.max_file_size;
    if bytes.len() > limit {
        // Rejected before the converter ever sees the payload
        return Err(AppError::PayloadTooLarge { limit });
    }

    info!(
        filename = %filename,
        content_type = %content_type,
        size_bytes = bytes.len(),
        "Dispatching document to converter"
    );

    let markdown = state.converter.convert(bytes, filename, content_type).await?;

    // A converter that ran cleanly but extracted nothing is a different
    // failure than a converter that errored; callers get 422, not 500.
    let markdown = markdown.trim();
    if markdown.is_empty() {
        return Err(AppError::EmptyConversion);
    }

    Ok(ConvertResponse {
        filename: filename.to_string(),
        content_type: content_type.to_string(),
        size_bytes: bytes.len(),
        markdown: markdown.to_string(),
    })
}

/// POST /convert - Convert an uploaded document to Markdown
pub async fn convert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    check_api_key(&headers, &state)?;
    let limit = state.config.limits.max_file_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let field_name = field.name().unwrap_or("");
        if field_name != FILE_FIELD {
            warn!(field = %field_name, "Ignoring unknown multipart field");
            continue;
        }

        // Grab the metadata before the field is consumed
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit))?;

        let response = convert_payload(&state, &data, &filename, &content_type).await?;
        return Ok(Json(response));
    }

    Err(AppError::MissingFile(FILE_FIELD.to_string()))
}

/// POST /convert-base64 - Convert a base64-encoded document to Markdown
pub async fn convert_base64(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<Base64ConvertRequest>,
) -> Result<Json<ConvertResponse>, AppError> {
    check_api_key(&headers, &state)?;

    // Tolerate data-URL payloads ("data:application/pdf;base64,....")
    let encoded = match request.base64_content.split_once(',') {
        Some((_, rest)) => rest,
        None => request.base64_content.as_str(),
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::InvalidBase64)?;

    let response = convert_payload(&state, &bytes, &request.filename, &request.mimetype).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, Config, ConverterConfig, LimitsConfig, ServerConfig};
    use crate::converter::{ConvertError, DocumentConverter};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake converter returning the payload bytes as UTF-8, counting calls
    struct EchoConverter {
        calls: AtomicUsize,
    }

    impl EchoConverter {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentConverter for EchoConverter {
        async fn convert(
            &self,
            bytes: &[u8],
            _filename: &str,
            _content_type: &str,
        ) -> Result<String, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }

    /// Fake converter that always returns whitespace
    struct WhitespaceConverter;

    #[async_trait]
    impl DocumentConverter for WhitespaceConverter {
        async fn convert(&self, _: &[u8], _: &str, _: &str) -> Result<String, ConvertError> {
            Ok("  \n\t ".to_string())
        }
    }

    /// Fake converter that always fails
    struct FailingConverter;

    #[async_trait]
    impl DocumentConverter for FailingConverter {
        async fn convert(&self, _: &[u8], _: &str, _: &str) -> Result<String, ConvertError> {
            Err(ConvertError::ProcessFailed("tool blew up".to_string()))
        }
    }

    fn test_state(converter: Arc<dyn DocumentConverter>, api_key: Option<&str>) -> AppState {
        AppState::new(
            Config {
                server: ServerConfig {
                    port: 0,
                    host: "127.0.0.1".to_string(),
                },
                auth: AuthConfig {
                    api_key: api_key.map(String::from),
                },
                limits: LimitsConfig { max_file_size: 64 },
                converter: ConverterConfig { timeout_secs: 5 },
            },
            converter,
        )
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key.parse().unwrap());
        headers
    }

    #[test]
    fn test_check_api_key_match() {
        let state = test_state(Arc::new(EchoConverter::new()), Some("secret"));
        assert!(check_api_key(&headers_with_key("secret"), &state).is_ok());
    }

    #[test]
    fn test_check_api_key_mismatch() {
        let state = test_state(Arc::new(EchoConverter::new()), Some("secret"));
        let result = check_api_key(&headers_with_key("wrong"), &state);
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
    }

    #[test]
    fn test_check_api_key_missing_header() {
        let state = test_state(Arc::new(EchoConverter::new()), Some("secret"));
        let result = check_api_key(&HeaderMap::new(), &state);
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
    }

    #[test]
    fn test_check_api_key_disabled() {
        let state = test_state(Arc::new(EchoConverter::new()), None);
        assert!(check_api_key(&HeaderMap::new(), &state).is_ok());
    }

    #[tokio::test]
    async fn test_convert_payload_success() {
        let state = test_state(Arc::new(EchoConverter::new()), None);
        let response = convert_payload(&state, b"Hello", "doc.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(response.filename, "doc.txt");
        assert_eq!(response.content_type, "text/plain");
        assert_eq!(response.size_bytes, 5);
        assert_eq!(response.markdown, "Hello");
    }

    #[tokio::test]
    async fn test_convert_payload_empty_file() {
        let converter = Arc::new(EchoConverter::new());
        let state = test_state(converter.clone(), None);
        let result = convert_payload(&state, b"", "doc.txt", "text/plain").await;
        assert!(matches!(result.unwrap_err(), AppError::EmptyFile));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_convert_payload_too_large_skips_converter() {
        let converter = Arc::new(EchoConverter::new());
        let state = test_state(converter.clone(), None);
        let oversized = vec![b'x'; 65];
        let result = convert_payload(&state, &oversized, "big.txt", "text/plain").await;
        match result.unwrap_err() {
            AppError::PayloadTooLarge { limit } => {
                assert_eq!(limit, 64);
            }
            other => panic!("Expected PayloadTooLarge error, got: {:?}", other),
        }
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_convert_payload_whitespace_result() {
        let state = test_state(Arc::new(WhitespaceConverter), None);
        let result = convert_payload(&state, b"data", "doc.pdf", "application/pdf").await;
        assert!(matches!(result.unwrap_err(), AppError::EmptyConversion));
    }

    #[tokio::test]
    async fn test_convert_payload_converter_failure() {
        let state = test_state(Arc::new(FailingConverter), None);
        let result = convert_payload(&state, b"data", "doc.pdf", "application/pdf").await;
        assert!(matches!(result.unwrap_err(), AppError::Conversion(_)));
    }

    #[tokio::test]
    async fn test_convert_base64_with_data_url_prefix() {
        let state = Arc::new(test_state(Arc::new(EchoConverter::new()), Some("secret")));
        let request = Base64ConvertRequest {
            filename: "doc.txt".to_string(),
            mimetype: "text/plain".to_string(),
            base64_content: "data:text/plain;base64,SGVsbG8=".to_string(),
        };
        let response = convert_base64(State(state), headers_with_key("secret"), Json(request))
            .await
            .unwrap();
        assert_eq!(response.0.markdown, "Hello");
        assert_eq!(response.0.size_bytes, 5);
    }

    #[tokio::test]
    async fn test_convert_base64_invalid_content() {
        let state = Arc::new(test_state(Arc::new(EchoConverter::new()), None));
        let request = Base64ConvertRequest {
            filename: "doc.txt".to_string(),
            mimetype: "text/plain".to_string(),
            base64_content: "!!! not base64 !!!".to_string(),
        };
        let result = convert_base64(State(state), HeaderMap::new(), Json(request)).await;
        assert!(matches!(result.unwrap_err(), AppError::InvalidBase64));
    }

    #[tokio::test]
    async fn test_convert_base64_requires_key() {
        let converter = Arc::new(EchoConverter::new());
        let state = Arc::new(test_state(converter.clone(), Some("secret")));
        let request = Base64ConvertRequest {
            filename: "doc.txt".to_string(),
            mimetype: "text/plain".to_string(),
            base64_content: "SGVsbG8=".to_string(),
        };
        let result = convert_base64(State(state), HeaderMap::new(), Json(request)).await;
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }
}
