//! CLI-backed converter implementation
//!
//! Converts documents by spawning the conversion tools installed in the
//! runtime image and capturing their output: pandoc for documents, tesseract
//! for images. Text-like uploads are passed through as-is.

use crate::converter::{ConvertError, DocumentConverter};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Extensions handled by returning the decoded bytes directly
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Extensions routed through OCR
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp"];

/// Converter that shells out to system conversion tools
pub struct CliConverter {
    /// Timeout for a single tool invocation
    tool_timeout: Duration,
}

/// How a document is routed to the conversion tooling
#[derive(Debug, PartialEq, Eq)]
enum DocumentKind {
    /// Already plain text or Markdown, returned as-is
    Text,
    /// Raster image, handed to the OCR engine
    Image,
    /// Legacy binary Word document, pandoc with explicit `--from doc` first
    LegacyWord,
    /// Anything else, pandoc with format auto-detection
    Document,
}

/// Pick a file extension: from the declared filename if it has one, otherwise
/// guessed from the declared content type.
fn guess_extension(filename: &str, content_type: &str) -> String {
    if let Some(ext) = Path::new(filename).extension().and_then(OsStr::to_str) {
        return ext.to_ascii_lowercase();
    }
    match content_type {
        "text/plain" => "txt",
        "text/markdown" => "md",
        "text/html" => "html",
        "text/csv" => "csv",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.oasis.opendocument.text" => "odt",
        "application/rtf" => "rtf",
        "application/epub+zip" => "epub",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/tiff" => "tiff",
        "image/bmp" => "bmp",
        _ => "",
    }
    .to_string()
}

fn classify(extension: &str, content_type: &str) -> DocumentKind {
    if TEXT_EXTENSIONS.contains(&extension) {
        DocumentKind::Text
    } else if IMAGE_EXTENSIONS.contains(&extension) || content_type.starts_with("image/") {
        DocumentKind::Image
    } else if extension == "doc" || content_type == "application/msword" {
        DocumentKind::LegacyWord
    } else {
        DocumentKind::Document
    }
}

impl CliConverter {
    /// Create a new CLI converter with the given per-tool timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            tool_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run a conversion tool and capture its stdout
    async fn run_tool(&self, program: &str, args: &[&str]) -> Result<String, ConvertError> {
        debug!(program = %program, args = ?args, "Spawning conversion tool");

        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = match timeout(self.tool_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ConvertError::SpawnFailed(e)),
            Err(_) => return Err(ConvertError::Timeout(self.tool_timeout.as_secs())),
        };

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| {
                ConvertError::InvalidEncoding(format!("Failed to decode stdout: {}", e))
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            Err(ConvertError::ProcessFailed(format!(
                "{} exited with code {}: {}",
                program, exit_code, stderr
            )))
        }
    }

    /// Convert via pandoc, retrying with format auto-detection when the
    /// explicit `--from doc` pass rejects the file (antiword handles genuine
    /// legacy .doc binaries; mislabeled files often still parse on retry).
    async fn run_pandoc(&self, path: &str, legacy_word: bool) -> Result<String, ConvertError> {
        if legacy_word {
            match self
                .run_tool("pandoc", &[path, "--from", "doc", "--to", "markdown"])
                .await
            {
                Ok(markdown) => return Ok(markdown),
                Err(ConvertError::ProcessFailed(e)) => {
                    warn!(error = %e, "Explicit doc conversion failed, retrying with auto-detection");
                }
                Err(e) => return Err(e),
            }
        }
        self.run_tool("pandoc", &[path, "--to", "markdown"]).await
    }

    /// Run OCR on an image file
    async fn run_ocr(&self, path: &str) -> Result<String, ConvertError> {
        self.run_tool("tesseract", &[path, "stdout", "-l", "por+eng"])
            .await
    }
}

#[async_trait]
impl DocumentConverter for CliConverter {
    async fn convert(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, ConvertError> {
        let extension = guess_extension(filename, content_type);
        let kind = classify(&extension, content_type);

        info!(
            filename = %filename,
            content_type = %content_type,
            size_bytes = bytes.len(),
            kind = ?kind,
            "Converting document"
        );

        if kind == DocumentKind::Text {
            let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                ConvertError::InvalidEncoding(format!("Text upload is not UTF-8: {}", e))
            })?;
            return Ok(text.trim().to_string());
        }

        // The tools want a file path with a meaningful extension; stage the
        // upload in a temp file that is removed when it goes out of scope.
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{}", extension)
        };
        let staged = tempfile::Builder::new()
            .prefix("doc2md-")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(staged.path(), bytes).await?;
        let path = staged.path().to_string_lossy().to_string();

        let markdown = match kind {
            DocumentKind::Image => self.run_ocr(&path).await?,
            DocumentKind::LegacyWord => self.run_pandoc(&path, true).await?,
            _ => self.run_pandoc(&path, false).await?,
        };

        Ok(markdown.trim().to_string())
    }
}
