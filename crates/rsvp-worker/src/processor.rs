//! Per-job synthesis pipeline.
//!
//! Runs on a blocking thread: segmentation once, then render -> encode per
//! display unit, with cancellation and the wall-clock deadline observed
//! between units, never mid-frame. Terminal bookkeeping (store transitions,
//! artifact cleanup) is applied by the async worker loop from the returned
//! outcome.

use std::path::Path;
use std::time::Instant;

use tokio::sync::watch;
use tracing::debug;

use rsvp_media::{segment, FrameRenderer, FrameSink, MediaError, CANVAS_HEIGHT, CANVAS_WIDTH};
use rsvp_models::{ErrorCode, JobId, Settings};

use crate::store::JobStore;

/// How one job's pipeline ended.
#[derive(Debug)]
pub(crate) enum PipelineOutcome {
    Completed,
    Cancelled,
    Failed { code: ErrorCode, detail: String },
}

impl PipelineOutcome {
    fn failed(code: ErrorCode, err: impl std::fmt::Display) -> Self {
        Self::Failed {
            code,
            detail: err.to_string(),
        }
    }
}

/// Drive one job from text to a finished (unpublished) encode.
///
/// The sink owns the output path; on success the artifact has already been
/// atomically published by `finish`.
pub(crate) fn run_pipeline(
    job_id: &JobId,
    text: &str,
    settings: &Settings,
    store: &JobStore,
    cancel_rx: &watch::Receiver<bool>,
    deadline: Instant,
    font_dir: Option<&Path>,
    sink: &mut dyn FrameSink,
) -> PipelineOutcome {
    let units = match segment(text, settings) {
        Ok(units) => units,
        // Unreachable for inputs that passed submission, but mapped anyway.
        Err(e) => return PipelineOutcome::failed(ErrorCode::Validation, e),
    };

    store.start(job_id, units.len());
    debug!(job_id = %job_id, units = units.len(), "Starting synthesis");

    if Instant::now() >= deadline {
        sink.abort();
        return PipelineOutcome::failed(ErrorCode::Timeout, "job exceeded wall-clock budget");
    }

    let mut renderer = match FrameRenderer::new(settings, font_dir) {
        Ok(renderer) => renderer,
        Err(e) => {
            sink.abort();
            return PipelineOutcome::failed(ErrorCode::Render, e);
        }
    };

    if let Err(e) = sink.begin(CANVAS_WIDTH, CANVAS_HEIGHT) {
        sink.abort();
        return PipelineOutcome::failed(ErrorCode::Encode, e);
    }

    for unit in &units {
        if *cancel_rx.borrow() {
            sink.abort();
            return PipelineOutcome::Cancelled;
        }
        if Instant::now() >= deadline {
            sink.abort();
            return PipelineOutcome::failed(ErrorCode::Timeout, "job exceeded wall-clock budget");
        }

        let frame = renderer.render(unit);
        if let Err(e) = sink.push_frame(&frame) {
            sink.abort();
            return PipelineOutcome::failed(ErrorCode::Encode, e);
        }

        store.progress(job_id, unit.index + 1);
    }

    store.note(job_id, "Encoding video");
    match sink.finish() {
        Ok(()) => PipelineOutcome::Completed,
        Err(MediaError::Timeout(secs)) => PipelineOutcome::failed(
            ErrorCode::Timeout,
            format!("encoder did not finish within {secs}s"),
        ),
        Err(e) => PipelineOutcome::failed(ErrorCode::Encode, e),
    }
}
