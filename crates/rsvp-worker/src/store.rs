//! In-memory job table with snapshot reads.
//!
//! The store is the only shared mutable state besides the queue. Mutation
//! goes through these methods (called by the owning worker, plus the
//! cancellation flag from any caller); reads clone a consistent snapshot
//! under the lock, so a poll never observes a torn mix of fields.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use rsvp_models::{ErrorCode, Job, JobId, JobState, JobStatus};
use tokio::sync::watch;

use crate::error::JobError;

struct JobEntry {
    job: Job,
    cancel_tx: watch::Sender<bool>,
}

/// Owned job registry keyed by job id.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending job.
    pub fn insert(&self, job: Job) {
        let (cancel_tx, _) = watch::channel(false);
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        jobs.insert(job.id.clone(), JobEntry { job, cancel_tx });
    }

    /// Consistent snapshot of a job record.
    pub fn snapshot(&self, id: &JobId) -> Option<Job> {
        let jobs = self.jobs.read().expect("job table lock poisoned");
        jobs.get(id).map(|entry| entry.job.clone())
    }

    /// Caller-facing status snapshot.
    pub fn status(&self, id: &JobId) -> Result<JobStatus, JobError> {
        self.snapshot(id)
            .map(|job| job.status())
            .ok_or(JobError::NotFound)
    }

    /// Cancellation signal for the worker processing this job.
    pub fn cancel_receiver(&self, id: &JobId) -> Option<watch::Receiver<bool>> {
        let jobs = self.jobs.read().expect("job table lock poisoned");
        jobs.get(id).map(|entry| entry.cancel_tx.subscribe())
    }

    /// Set the cancellation flag. Idempotent; a no-op on terminal jobs.
    pub fn request_cancel(&self, id: &JobId) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        let entry = jobs.get_mut(id).ok_or(JobError::NotFound)?;
        if !entry.job.state.is_terminal() {
            entry.job.cancel_requested = true;
            entry.cancel_tx.send_replace(true);
        }
        Ok(())
    }

    /// Transition to processing with a fixed unit total.
    pub fn start(&self, id: &JobId, total: usize) {
        self.with_entry(id, |job| job.start(total));
    }

    /// Record per-unit progress.
    pub fn progress(&self, id: &JobId, current: usize) {
        self.with_entry(id, |job| job.set_progress(current));
    }

    /// Update the progress message without touching counters.
    pub fn note(&self, id: &JobId, message: impl Into<String>) {
        self.with_entry(id, |job| {
            if job.state == JobState::Processing {
                job.message = message.into();
            }
        });
    }

    pub fn complete(&self, id: &JobId, artifact: PathBuf) {
        self.with_entry(id, |job| job.complete(artifact));
    }

    pub fn fail(&self, id: &JobId, code: ErrorCode, detail: impl Into<String>) {
        self.with_entry(id, |job| job.fail(code, detail));
    }

    pub fn cancelled(&self, id: &JobId) {
        self.with_entry(id, |job| job.cancel());
    }

    /// Remove a job record entirely.
    pub fn remove(&self, id: &JobId) {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        jobs.remove(id);
    }

    /// Terminal jobs whose retention window has elapsed.
    pub fn expired(&self, retention: Duration) -> Vec<JobId> {
        let jobs = self.jobs.read().expect("job table lock poisoned");
        let now = Utc::now();
        jobs.values()
            .filter(|entry| {
                entry.job.state.is_terminal()
                    && entry.job.finished_at.is_some_and(|finished| {
                        (now - finished).num_milliseconds() >= retention.as_millis() as i64
                    })
            })
            .map(|entry| entry.job.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().expect("job table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entry(&self, id: &JobId, f: impl FnOnce(&mut Job)) {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        if let Some(entry) = jobs.get_mut(id) {
            f(&mut entry.job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_job(store: &JobStore) -> JobId {
        let job = Job::new(10);
        let id = job.id.clone();
        store.insert(job);
        id
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let store = JobStore::new();
        let id = insert_job(&store);

        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.state, JobState::Pending);
        assert_eq!(snapshot.word_count, 10);
    }

    #[test]
    fn test_status_not_found() {
        let store = JobStore::new();
        assert!(matches!(
            store.status(&JobId::new()),
            Err(JobError::NotFound)
        ));
    }

    #[test]
    fn test_cancel_flag_propagates() {
        let store = JobStore::new();
        let id = insert_job(&store);

        let rx = store.cancel_receiver(&id).unwrap();
        assert!(!*rx.borrow());

        store.request_cancel(&id).unwrap();
        assert!(*rx.borrow());
        assert!(store.snapshot(&id).unwrap().cancel_requested);
    }

    #[test]
    fn test_cancel_terminal_is_noop() {
        let store = JobStore::new();
        let id = insert_job(&store);

        store.start(&id, 4);
        store.complete(&id, PathBuf::from("/tmp/out.mp4"));

        store.request_cancel(&id).unwrap();
        let job = store.snapshot(&id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(!job.cancel_requested);
    }

    #[test]
    fn test_expired_only_returns_old_terminal_jobs() {
        let store = JobStore::new();
        let running = insert_job(&store);
        store.start(&running, 4);

        let done = insert_job(&store);
        store.start(&done, 4);
        store.fail(&done, ErrorCode::Encode, "boom");

        let expired = store.expired(Duration::ZERO);
        assert_eq!(expired, vec![done.clone()]);

        // Nothing is old enough under a long retention window.
        assert!(store.expired(Duration::from_secs(3600)).is_empty());

        store.remove(&done);
        assert!(store.expired(Duration::ZERO).is_empty());
    }
}
