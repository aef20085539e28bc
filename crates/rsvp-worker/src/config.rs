//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker pool and lifecycle configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of worker tasks pulling from the queue
    pub worker_count: usize,
    /// Bounded queue capacity; submissions beyond this fail fast
    pub queue_capacity: usize,
    /// Directory holding per-job artifact subdirectories
    pub work_dir: PathBuf,
    /// Per-job wall-clock ceiling
    pub job_timeout: Duration,
    /// How long terminal jobs and their artifacts are retained
    pub retention_ttl: Duration,
    /// How often the reclaimer sweeps expired jobs
    pub sweep_interval: Duration,
    /// Output frame rate
    pub target_fps: u32,
    /// Optional font directory overriding the system lookup
    pub font_dir: Option<PathBuf>,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            queue_capacity: 64,
            work_dir: PathBuf::from("/tmp/rsvp_videos"),
            job_timeout: Duration::from_secs(3600),
            retention_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            target_fps: 30,
            font_dir: None,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_count: env_parse("RSVP_WORKER_COUNT", defaults.worker_count),
            queue_capacity: env_parse("RSVP_QUEUE_CAPACITY", defaults.queue_capacity),
            work_dir: std::env::var("RSVP_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            job_timeout: Duration::from_secs(env_parse(
                "RSVP_JOB_TIMEOUT_SECS",
                defaults.job_timeout.as_secs(),
            )),
            retention_ttl: Duration::from_secs(env_parse(
                "RSVP_RETENTION_TTL_SECS",
                defaults.retention_ttl.as_secs(),
            )),
            sweep_interval: Duration::from_secs(env_parse(
                "RSVP_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            target_fps: env_parse("RSVP_TARGET_FPS", defaults.target_fps),
            font_dir: std::env::var("RSVP_FONT_DIR").map(PathBuf::from).ok(),
            shutdown_timeout: Duration::from_secs(env_parse(
                "RSVP_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
