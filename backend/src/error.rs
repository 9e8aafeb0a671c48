//! Error types and error handling for the application
//!
//! None of these are fatal: the view layer reports them, or the reconciler
//! turns them into a visible failure message.

use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Contact with the given ID was not found
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    /// World-book entry with the given ID was not found
    #[error("World entry not found: {0}")]
    EntryNotFound(String),

    /// Error occurred during state persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),

    /// Error occurred while talking to the generative API
    #[error("Generation error: {0}")]
    Generation(#[from] crate::gemini::GenerationError),

    /// Internal error (catch-all for unexpected errors)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
