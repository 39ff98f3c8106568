//! Converter-specific error types
//!
//! Errors that can occur while delegating a document to the external
//! conversion tooling (process spawning, timeouts, output decoding).

use thiserror::Error;

/// Errors that can occur during document conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Conversion tool exited with a non-zero status
    #[error("Conversion tool failed: {0}")]
    ProcessFailed(String),

    /// Conversion exceeded the configured timeout
    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    /// Failed to spawn the conversion tool (e.g., binary not installed)
    #[error("Failed to spawn conversion tool: {0}")]
    SpawnFailed(std::io::Error),

    /// Tool output (or text-like input) could not be decoded as UTF-8
    #[error("Invalid output encoding: {0}")]
    InvalidEncoding(String),

    /// Failed to stage the upload on disk before conversion
    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}
