//! Shared data models for the RSVP video backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job states and status snapshots
//! - Render settings (pace, grouping, fonts, colors)
//! - Display units produced by the timing engine
//! - The error taxonomy surfaced in job records

pub mod color;
pub mod error;
pub mod job;
pub mod settings;
pub mod unit;

// Re-export common types
pub use color::{Rgb, RgbParseError};
pub use error::ErrorCode;
pub use job::{Job, JobId, JobState, JobStatus};
pub use settings::{FontFamily, Settings, SettingsError, MAX_UPLOAD_BYTES, MAX_WORDS};
pub use unit::DisplayUnit;
