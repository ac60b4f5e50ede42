//! Error types for the resource cache.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving or loading cached resources.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No file matched the name, neither as given nor under a search path.
    #[error("resource '{0}' not found")]
    NotFound(String),

    /// The loader rejected the file contents.
    #[error("failed to load '{}': {reason}", path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for resource operations.
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;
