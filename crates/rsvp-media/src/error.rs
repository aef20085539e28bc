//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during timing, rendering or encoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("text is empty after trimming")]
    EmptyText,

    #[error("text exceeds the {limit} word limit (found {found} words)")]
    TooManyWords { found: usize, limit: usize },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("font family '{family}' could not be loaded: {detail}")]
    FontLoad { family: String, detail: String },

    #[error("frame size mismatch: got {got_width}x{got_height}, expected {want_width}x{want_height}")]
    FrameSizeMismatch {
        got_width: u32,
        got_height: u32,
        want_width: u32,
        want_height: u32,
    },

    #[error("encoder sink used out of order: {0}")]
    SinkState(&'static str),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a font loading error.
    pub fn font_load(family: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::FontLoad {
            family: family.into(),
            detail: detail.into(),
        }
    }
}
