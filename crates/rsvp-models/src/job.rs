//! Job records and status snapshots.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ErrorCode;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
///
/// Transitions are strictly forward: `Pending -> Processing -> {Completed |
/// Failed | Cancelled}`. Terminal states are never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job is waiting in queue
    #[default]
    Pending,
    /// Job is being processed by a worker
    Processing,
    /// Job completed successfully, artifact available
    Completed,
    /// Job failed, error code recorded
    Failed,
    /// Job was cancelled by the caller
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text-to-video conversion request and its lifecycle state.
///
/// Mutated only by the worker that owns it (and by a cancellation request
/// setting the flag); every transition method refuses to leave a terminal
/// state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID, immutable once assigned
    pub id: JobId,

    /// Current lifecycle state
    #[serde(default)]
    pub state: JobState,

    /// Progress percent (0-100), non-decreasing while processing
    #[serde(default)]
    pub percent: u8,

    /// Display units rendered so far
    #[serde(default)]
    pub current: usize,

    /// Total display units, fixed at the start of processing
    #[serde(default)]
    pub total: usize,

    /// Human-readable progress message
    #[serde(default)]
    pub message: String,

    /// Word count of the submitted text
    #[serde(default)]
    pub word_count: usize,

    /// Finished artifact path, set only on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    /// Error taxonomy code, set only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    /// Error detail, set only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Whether cancellation has been requested
    #[serde(default)]
    pub cancel_requested: bool,
}

impl Job {
    /// Create a new pending job.
    pub fn new(word_count: usize) -> Self {
        Self {
            id: JobId::new(),
            state: JobState::Pending,
            percent: 0,
            current: 0,
            total: 0,
            message: "Job is queued".to_string(),
            word_count,
            artifact: None,
            error_code: None,
            error_detail: None,
            created_at: Utc::now(),
            finished_at: None,
            cancel_requested: false,
        }
    }

    /// Begin processing, fixing the unit total. No-op unless pending.
    pub fn start(&mut self, total: usize) {
        if self.state != JobState::Pending {
            return;
        }
        self.state = JobState::Processing;
        self.total = total;
        self.message = "Generating frames".to_string();
    }

    /// Record per-unit progress. No-op unless processing.
    pub fn set_progress(&mut self, current: usize) {
        if self.state != JobState::Processing {
            return;
        }
        let current = current.min(self.total);
        self.current = current;
        self.percent = if self.total == 0 {
            0
        } else {
            (current * 100 / self.total) as u8
        };
        self.message = format!("Generating frames ({}/{})", current, self.total);
    }

    /// Mark the job completed with its artifact path. No-op on terminal states.
    pub fn complete(&mut self, artifact: PathBuf) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Completed;
        self.percent = 100;
        self.current = self.total;
        self.artifact = Some(artifact);
        self.message = "Completed".to_string();
        self.finished_at = Some(Utc::now());
    }

    /// Mark the job failed with a taxonomy code. No-op on terminal states.
    pub fn fail(&mut self, code: ErrorCode, detail: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Failed;
        self.error_code = Some(code);
        let detail = detail.into();
        self.message = format!("Job failed: {}", detail);
        self.error_detail = Some(detail);
        self.finished_at = Some(Utc::now());
    }

    /// Mark the job cancelled. No-op on terminal states.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Cancelled;
        self.message = "Cancelled".to_string();
        self.finished_at = Some(Utc::now());
    }

    /// Build the caller-facing status snapshot.
    pub fn status(&self) -> JobStatus {
        JobStatus {
            job_id: self.id.clone(),
            status: self.state,
            percent: self.percent,
            current: self.current,
            total: self.total,
            message: self.message.clone(),
            word_count: if self.word_count > 0 {
                Some(self.word_count)
            } else {
                None
            },
            download_ref: self
                .artifact
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            error_code: self.error_code,
        }
    }
}

/// Caller-facing snapshot of a job, returned by status polling.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatus {
    pub job_id: JobId,
    pub status: JobState,
    pub percent: u8,
    pub current: usize,
    pub total: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn test_forward_transitions() {
        let mut job = Job::new(5);
        assert_eq!(job.state, JobState::Pending);

        job.start(5);
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.total, 5);

        job.complete(PathBuf::from("/tmp/out.mp4"));
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.percent, 100);
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_terminal_states_immutable() {
        let mut job = Job::new(5);
        job.start(5);
        job.cancel();
        assert_eq!(job.state, JobState::Cancelled);

        job.complete(PathBuf::from("/tmp/out.mp4"));
        assert_eq!(job.state, JobState::Cancelled);
        assert!(job.artifact.is_none());

        job.fail(ErrorCode::Encode, "boom");
        assert_eq!(job.state, JobState::Cancelled);
        assert!(job.error_code.is_none());
    }

    #[test]
    fn test_percent_floor_and_clamp() {
        let mut job = Job::new(3);
        job.start(3);

        job.set_progress(1);
        assert_eq!(job.percent, 33);

        job.set_progress(2);
        assert_eq!(job.percent, 66);

        // current never exceeds total
        job.set_progress(10);
        assert_eq!(job.current, 3);
        assert_eq!(job.percent, 100);
    }

    #[test]
    fn test_progress_requires_processing() {
        let mut job = Job::new(3);
        job.set_progress(2);
        assert_eq!(job.current, 0);
        assert_eq!(job.state, JobState::Pending);
    }

    #[test]
    fn test_status_snapshot() {
        let mut job = Job::new(7);
        job.start(7);
        job.set_progress(3);

        let status = job.status();
        assert_eq!(status.status, JobState::Processing);
        assert_eq!(status.current, 3);
        assert_eq!(status.total, 7);
        assert_eq!(status.word_count, Some(7));
        assert!(status.download_ref.is_none());
    }
}
