//! Error types for the Roblox HTTP client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Response handling errors
    #[error("Response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper methods for common error construction
impl Error {
    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
