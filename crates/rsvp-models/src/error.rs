//! Error taxonomy surfaced in job records and submission responses.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of every failure a caller can observe.
///
/// Anything detectable before a job starts processing is returned
/// synchronously at submission; failures during processing are recorded in
/// the job record and only visible through status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Bad input shape or range, rejected at submission
    Validation,
    /// The text extractor collaborator failed to produce text
    Extraction,
    /// Job queue is at capacity, retry later
    Capacity,
    /// Frame rendering failed (e.g. font could not be loaded)
    Render,
    /// Video encoding subprocess failed
    Encode,
    /// Job exceeded its wall-clock budget
    Timeout,
    /// Unknown or expired job id
    NotFound,
    /// User-requested abort, distinct from failure
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "validation",
            ErrorCode::Extraction => "extraction",
            ErrorCode::Capacity => "capacity",
            ErrorCode::Render => "render",
            ErrorCode::Encode => "encode",
            ErrorCode::Timeout => "timeout",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
