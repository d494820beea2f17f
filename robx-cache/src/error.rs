//! Error types for the robx-cache crate

use thiserror::Error;

/// Result type for robx-cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
///
/// None of these ever reach a caller of the public `get`/`put` surface:
/// cache failures degrade to misses or skipped writes.
#[derive(Debug, Error)]
pub enum Error {
    /// Cache directory could not be determined
    #[error("Could not determine cache directory for the current platform")]
    CacheDirectoryNotFound,

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry could not be rehydrated
    #[error("Cache entry corrupt: {0}")]
    CorruptEntry(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying HTTP client error
    #[error("Client error: {0}")]
    Client(#[from] robx_client::Error),
}

impl Error {
    /// Create a corrupt entry error
    pub fn corrupt_entry(reason: impl Into<String>) -> Self {
        Self::CorruptEntry(reason.into())
    }
}
