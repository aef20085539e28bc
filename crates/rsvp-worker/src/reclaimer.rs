//! Artifact reclaimer.
//!
//! Terminal jobs keep their artifact until the retention window elapses;
//! after that the artifact directory is deleted and the record evicted, so
//! later status or download attempts see NotFound.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::manager::WorkerContext;

pub(crate) async fn run_reclaimer(ctx: Arc<WorkerContext>, mut shutdown_rx: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(ctx.config.sweep_interval);
    debug!(
        retention_secs = ctx.config.retention_ttl.as_secs(),
        "Reclaimer started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    debug!("Reclaimer stopped");
                    break;
                }
            }
            _ = interval.tick() => {
                sweep(&ctx).await;
            }
        }
    }
}

async fn sweep(ctx: &WorkerContext) {
    let expired = ctx.store.expired(ctx.config.retention_ttl);
    for id in expired {
        let dir = ctx.job_dir(&id);
        if dir.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                warn!(job_id = %id, "Failed to remove artifact dir {}: {e}", dir.display());
                continue;
            }
        }
        ctx.store.remove(&id);
        info!(job_id = %id, "Reclaimed expired job");
    }
}
