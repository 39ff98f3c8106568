//! Shared application state
//!
//! Immutable after startup: configuration plus the converter capability.
//! No locking is needed — handlers only read from it.

use crate::config::Config;
use crate::converter::DocumentConverter;
use std::sync::Arc;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration, loaded once at startup
    pub config: Config,
    /// The conversion capability; injectable so tests can use a fake
    pub converter: Arc<dyn DocumentConverter>,
}

impl AppState {
    /// Create application state from configuration and a converter
    pub fn new(config: Config, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { config, converter }
    }
}
