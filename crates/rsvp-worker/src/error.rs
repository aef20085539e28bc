//! Worker error types.

use rsvp_models::ErrorCode;
use thiserror::Error;

/// Errors returned synchronously from job submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("job queue is at capacity")]
    Capacity,

    #[error("service is shutting down")]
    ShuttingDown,
}

impl SubmitError {
    /// Taxonomy code for this submission failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubmitError::Validation(_) => ErrorCode::Validation,
            SubmitError::Extraction(_) => ErrorCode::Extraction,
            SubmitError::Capacity | SubmitError::ShuttingDown => ErrorCode::Capacity,
        }
    }
}

/// Errors returned from job lookups (status, cancel, result).
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found")]
    NotFound,
}
