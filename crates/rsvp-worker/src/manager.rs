//! Job manager: validated submission, worker pool, status and cancellation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use rsvp_media::{EncoderConfig, FfmpegSinkFactory, SinkFactory};
use rsvp_models::{Job, JobId, JobStatus, Settings, MAX_UPLOAD_BYTES, MAX_WORDS};

use crate::config::WorkerConfig;
use crate::error::{JobError, SubmitError};
use crate::extractor::{DocumentKind, PlainTextExtractor, TextExtractor};
use crate::processor::{run_pipeline, PipelineOutcome};
use crate::queue::{JobQueue, QueueError, QueuedJob};
use crate::reclaimer::run_reclaimer;
use crate::store::JobStore;

/// Shared state reachable from worker tasks.
pub(crate) struct WorkerContext {
    pub(crate) config: WorkerConfig,
    pub(crate) store: JobStore,
    pub(crate) queue: JobQueue,
    pub(crate) sink_factory: Arc<dyn SinkFactory>,
}

impl WorkerContext {
    /// Artifact location for a job: one file under a job-scoped directory.
    pub(crate) fn artifact_path(&self, id: &JobId) -> PathBuf {
        self.config.work_dir.join(id.as_str()).join("output.mp4")
    }

    pub(crate) fn job_dir(&self, id: &JobId) -> PathBuf {
        self.config.work_dir.join(id.as_str())
    }
}

/// Orchestrates the full lifecycle of synthesis jobs.
///
/// Owns the job store, the bounded queue, a fixed pool of worker tasks and
/// the artifact reclaimer. Must be created inside a Tokio runtime.
pub struct JobManager {
    ctx: Arc<WorkerContext>,
    extractor: Arc<dyn TextExtractor>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    reclaimer: std::sync::Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl JobManager {
    /// Create a manager encoding through the system ffmpeg.
    pub fn new(config: WorkerConfig) -> Self {
        let encoder = EncoderConfig {
            fps: config.target_fps,
            ..Default::default()
        };
        Self::with_sink_factory(config, Arc::new(FfmpegSinkFactory::new(encoder)))
    }

    /// Create a manager with a custom encoder sink factory.
    pub fn with_sink_factory(config: WorkerConfig, sink_factory: Arc<dyn SinkFactory>) -> Self {
        let ctx = Arc::new(WorkerContext {
            queue: JobQueue::new(config.queue_capacity),
            store: JobStore::new(),
            sink_factory,
            config,
        });

        let workers = (0..ctx.config.worker_count.max(1))
            .map(|worker| {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(worker_loop(ctx, worker))
            })
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reclaimer = tokio::spawn(run_reclaimer(Arc::clone(&ctx), shutdown_rx));

        Self {
            ctx,
            extractor: Arc::new(PlainTextExtractor),
            workers: std::sync::Mutex::new(workers),
            reclaimer: std::sync::Mutex::new(Some(reclaimer)),
            shutdown_tx,
        }
    }

    /// Replace the document extractor collaborator.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Validate and enqueue a synthesis job.
    ///
    /// Everything checkable before processing happens here, synchronously;
    /// later failures are only observable through [`JobManager::status`].
    pub fn submit(
        &self,
        text: impl Into<String>,
        settings: Settings,
    ) -> Result<JobId, SubmitError> {
        let text = text.into();

        if let Err(errors) = settings.validate() {
            let detail = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SubmitError::Validation(detail));
        }

        let word_count = text.split_whitespace().count();
        if word_count == 0 {
            return Err(SubmitError::Validation("no text content found".to_string()));
        }
        if word_count > MAX_WORDS {
            return Err(SubmitError::Validation(format!(
                "text exceeds the {MAX_WORDS} word limit (found {word_count} words)"
            )));
        }

        let job = Job::new(word_count);
        let id = job.id.clone();
        self.ctx.store.insert(job);

        let queued = QueuedJob {
            id: id.clone(),
            text,
            settings,
        };
        if let Err(e) = self.ctx.queue.enqueue(queued) {
            // The record never becomes visible for a rejected submission.
            self.ctx.store.remove(&id);
            return Err(match e {
                QueueError::Full => SubmitError::Capacity,
                QueueError::Closed => SubmitError::ShuttingDown,
            });
        }

        metrics::counter!("rsvp_jobs_submitted_total").increment(1);
        info!(job_id = %id, word_count, "Job submitted");
        Ok(id)
    }

    /// Extract text from an uploaded document and submit it.
    pub fn submit_document(
        &self,
        bytes: &[u8],
        kind: DocumentKind,
        settings: Settings,
    ) -> Result<JobId, SubmitError> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(SubmitError::Validation(format!(
                "file too large (max {} bytes)",
                MAX_UPLOAD_BYTES
            )));
        }
        let text = self
            .extractor
            .extract(bytes, kind)
            .map_err(|e| SubmitError::Extraction(e.to_string()))?;
        self.submit(text, settings)
    }

    /// Consistent snapshot of a job's externally visible state.
    pub fn status(&self, id: &JobId) -> Result<JobStatus, JobError> {
        self.ctx.store.status(id)
    }

    /// Request cooperative cancellation. Idempotent; terminal jobs are
    /// left untouched.
    pub fn cancel(&self, id: &JobId) -> Result<(), JobError> {
        self.ctx.store.request_cancel(id)?;
        info!(job_id = %id, "Cancellation requested");
        Ok(())
    }

    /// Artifact path of a completed, unexpired job.
    pub fn result(&self, id: &JobId) -> Result<PathBuf, JobError> {
        let job = self.ctx.store.snapshot(id).ok_or(JobError::NotFound)?;
        match job.artifact {
            Some(path) if path.is_file() => Ok(path),
            _ => Err(JobError::NotFound),
        }
    }

    /// Stop intake, drain in-flight jobs up to the shutdown timeout and
    /// stop the reclaimer.
    pub async fn shutdown(&self) {
        info!("Shutting down job manager");
        self.ctx.queue.close();
        self.shutdown_tx.send_replace(true);

        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self.workers.lock().expect("worker handle lock poisoned");
            guard.drain(..).collect()
        };
        let drained = tokio::time::timeout(self.ctx.config.shutdown_timeout, async {
            for handle in workers {
                let _ = handle.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("Shutdown timeout elapsed with jobs still in flight");
        }

        if let Some(handle) = self
            .reclaimer
            .lock()
            .expect("reclaimer handle lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

/// One worker: pull jobs until the queue closes, processing each
/// end-to-end. The queue hands every job to exactly one worker.
async fn worker_loop(ctx: Arc<WorkerContext>, worker: usize) {
    debug!(worker, "Worker started");
    while let Some(job) = ctx.queue.dequeue().await {
        process_one(&ctx, job, worker).await;
    }
    debug!(worker, "Worker stopped");
}

async fn process_one(ctx: &Arc<WorkerContext>, queued: QueuedJob, worker: usize) {
    let QueuedJob { id, text, settings } = queued;

    let Some(cancel_rx) = ctx.store.cancel_receiver(&id) else {
        // Evicted between submission and pickup; nothing to do.
        return;
    };
    if *cancel_rx.borrow() {
        info!(job_id = %id, "Job cancelled before processing started");
        ctx.store.cancelled(&id);
        metrics::counter!("rsvp_jobs_cancelled_total").increment(1);
        return;
    }

    info!(job_id = %id, worker, "Processing job");
    let artifact = ctx.artifact_path(&id);

    let mut sink = match ctx.sink_factory.create(&artifact) {
        Ok(sink) => sink,
        Err(e) => {
            error!(job_id = %id, "Failed to create encoder sink: {e}");
            ctx.store
                .fail(&id, rsvp_models::ErrorCode::Encode, e.to_string());
            metrics::counter!("rsvp_jobs_failed_total").increment(1);
            return;
        }
    };

    let deadline = Instant::now() + ctx.config.job_timeout;
    let pipeline_ctx = Arc::clone(ctx);
    let pipeline_id = id.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        run_pipeline(
            &pipeline_id,
            &text,
            &settings,
            &pipeline_ctx.store,
            &cancel_rx,
            deadline,
            pipeline_ctx.config.font_dir.as_deref(),
            sink.as_mut(),
        )
    })
    .await;

    match outcome {
        Ok(PipelineOutcome::Completed) => {
            info!(job_id = %id, "Job completed, artifact at {}", artifact.display());
            ctx.store.complete(&id, artifact);
            metrics::counter!("rsvp_jobs_completed_total").increment(1);
        }
        Ok(PipelineOutcome::Cancelled) => {
            info!(job_id = %id, "Job cancelled");
            ctx.store.cancelled(&id);
            discard_job_dir(ctx, &id).await;
            metrics::counter!("rsvp_jobs_cancelled_total").increment(1);
        }
        Ok(PipelineOutcome::Failed { code, detail }) => {
            error!(job_id = %id, code = %code, "Job failed: {detail}");
            ctx.store.fail(&id, code, detail);
            discard_job_dir(ctx, &id).await;
            metrics::counter!("rsvp_jobs_failed_total").increment(1);
        }
        Err(e) => {
            error!(job_id = %id, "Pipeline task aborted: {e}");
            ctx.store.fail(
                &id,
                rsvp_models::ErrorCode::Encode,
                format!("pipeline task aborted: {e}"),
            );
            discard_job_dir(ctx, &id).await;
            metrics::counter!("rsvp_jobs_failed_total").increment(1);
        }
    }
}

/// Discard partial artifacts after a failed or cancelled job.
async fn discard_job_dir(ctx: &WorkerContext, id: &JobId) {
    let dir = ctx.job_dir(id);
    if tokio::fs::remove_dir_all(&dir).await.is_err() {
        // Directory may never have been created.
        debug!(job_id = %id, "No job directory to discard");
    }
}
