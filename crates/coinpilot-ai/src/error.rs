//! Error types for coinpilot-ai

use thiserror::Error;

/// Result type alias using coinpilot-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the completion service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Response stream broke while being read
    #[error("Stream error: {0}")]
    Stream(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from a status code and response body
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is worth offering a retry for
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Stream(_) => true,
            Error::Api { status, message } => {
                let msg = message.to_lowercase();
                *status == 429
                    || (500..600).contains(status)
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
            }
            _ => false,
        }
    }
}
