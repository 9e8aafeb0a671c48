//! Generation-specific error types
//!
//! Errors that can occur while talking to the Gemini API.

use thiserror::Error;

/// Errors produced by the generative API client
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API credential was configured
    #[error("API key is empty")]
    MissingApiKey,

    /// The HTTP request could not be sent or the body could not be read
    #[error("Failed to reach Gemini API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Gemini API returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The API answered with HTTP 429
    #[error("Gemini API rate limit exceeded (HTTP 429): {0}")]
    RateLimited(String),

    /// The prompt was rejected by safety filters
    #[error("Gemini API blocked the prompt: {0}")]
    Blocked(String),

    /// The response body was not the expected JSON
    #[error("Failed to parse JSON response from Gemini API: {0}")]
    Decode(String),

    /// The response parsed but carried nothing usable
    #[error("Gemini API response contains no {0}")]
    Empty(&'static str),
}

impl GenerationError {
    /// Map a non-success HTTP status into the matching variant
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            GenerationError::RateLimited(body)
        } else {
            GenerationError::Status { status, body }
        }
    }
}
