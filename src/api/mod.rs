//! API module
//!
//! Contains HTTP request handlers for the conversion endpoints

pub mod convert;

// Re-export handlers for convenience (used by the router)
pub use convert::*;
