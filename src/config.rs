//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Loaded once at startup and immutable afterwards.

use std::env;
use std::fmt;

/// Default maximum accepted payload size (50 MiB)
const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Upload limits
    pub limits: LimitsConfig,
    /// Converter configuration
    pub converter: ConverterConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret compared against the `X-API-Key` header.
    /// When unset, authentication is disabled.
    pub api_key: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret must never end up in logs
        f.debug_struct("AuthConfig")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Upload limits
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum accepted payload size, in bytes
    pub max_file_size: usize,
}

/// Converter configuration
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Timeout for a single conversion subprocess (in seconds)
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            auth: AuthConfig {
                api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            },
            limits: LimitsConfig {
                max_file_size: env::var("MAX_FILE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            },
            converter: ConverterConfig {
                timeout_secs: env::var("CONVERT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(120),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
