//! Bounded in-process job queue.
//!
//! Submission is non-blocking: when the buffer is full the enqueue fails
//! fast instead of parking the caller, which is the system's backpressure
//! policy. Each queued job is handed to exactly one worker.

use rsvp_models::{JobId, Settings};
use thiserror::Error;
use tokio::sync::mpsc;

/// A job waiting for a worker.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: JobId,
    pub text: String,
    pub settings: Settings,
}

/// Enqueue failure.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,
}

/// Bounded FIFO queue feeding the worker pool.
pub struct JobQueue {
    tx: std::sync::Mutex<Option<mpsc::Sender<QueuedJob>>>,
    rx: tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx: std::sync::Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Enqueue without blocking.
    pub fn enqueue(&self, job: QueuedJob) -> Result<(), QueueError> {
        let sender = {
            let guard = self.tx.lock().expect("queue sender lock poisoned");
            guard.clone()
        };
        match sender {
            Some(tx) => tx.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            }),
            None => Err(QueueError::Closed),
        }
    }

    /// Receive the next job, or `None` once the queue is closed and drained.
    ///
    /// The receiver is shared behind a lock so each job is delivered to
    /// exactly one worker.
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        self.rx.lock().await.recv().await
    }

    /// Close the intake. Workers drain what is buffered, then stop.
    pub fn close(&self) {
        self.tx.lock().expect("queue sender lock poisoned").take();
    }
}
