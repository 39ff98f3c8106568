//! Document-to-Markdown conversion
//!
//! The handler layer only depends on the [`DocumentConverter`] trait; the
//! production implementation delegates to system tools (pandoc, tesseract)
//! and lives in [`cli`]. Tests inject fakes instead.

pub mod cli;
mod error;

pub use cli::CliConverter;
pub use error::ConvertError;

use async_trait::async_trait;

/// Opaque conversion capability: bytes + declared metadata in, Markdown out.
///
/// Implementations must be safe to share across concurrent requests; the
/// service holds a single instance behind an `Arc` for the process lifetime.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert a document to Markdown text.
    ///
    /// # Arguments
    /// * `bytes` - Raw file content as uploaded
    /// * `filename` - Filename as declared by the caller
    /// * `content_type` - MIME type as declared by the caller
    ///
    /// # Returns
    /// * `Ok(String)` - The Markdown text (may be empty; the handler decides
    ///   what an empty result means)
    /// * `Err(ConvertError)` - If the conversion tooling failed
    async fn convert(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, ConvertError>;
}
