//! Command-line driver: synthesize one RSVP video from a text file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rsvp_models::{JobState, Settings};
use rsvp_worker::{JobManager, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("rsvp=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(false))
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let input: PathBuf = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: rsvpgen <input.txt> [output.mp4]"))?;
    let output: Option<PathBuf> = args.next().map(PathBuf::from);

    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let settings = settings_from_env()?;
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let manager = JobManager::new(config);
    let job_id = manager.submit(text, settings)?;
    info!(job_id = %job_id, "Submitted");

    // Poll until the job settles, cancelling on ctrl-c.
    let mut poll = tokio::time::interval(Duration::from_millis(250));
    let mut last_percent = None;
    let status = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(job_id = %job_id, "Interrupt received, cancelling");
                manager.cancel(&job_id)?;
            }
            _ = poll.tick() => {
                let status = manager.status(&job_id)?;
                if last_percent != Some(status.percent) {
                    info!(job_id = %job_id, "{} {}% - {}", status.status, status.percent, status.message);
                    last_percent = Some(status.percent);
                }
                if status.status.is_terminal() {
                    break status;
                }
            }
        }
    };

    let exit = match status.status {
        JobState::Completed => {
            let artifact = manager.result(&job_id)?;
            if let Some(output) = output {
                std::fs::copy(&artifact, &output)
                    .with_context(|| format!("failed to copy artifact to {}", output.display()))?;
                println!("{}", output.display());
            } else {
                println!("{}", artifact.display());
            }
            Ok(())
        }
        JobState::Cancelled => Err(anyhow!("job cancelled")),
        _ => {
            error!(job_id = %job_id, "Job failed: {}", status.message);
            Err(anyhow!(status.message))
        }
    };

    manager.shutdown().await;
    exit
}

fn settings_from_env() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if let Ok(wpm) = std::env::var("RSVP_WPM") {
        settings.wpm = wpm.parse().context("RSVP_WPM must be an integer")?;
    }
    if let Ok(grouping) = std::env::var("RSVP_WORD_GROUPING") {
        settings.word_grouping = grouping
            .parse()
            .context("RSVP_WORD_GROUPING must be an integer")?;
    }
    if let Ok(font) = std::env::var("RSVP_FONT") {
        settings.font =
            serde_json::from_value::<rsvp_models::FontFamily>(serde_json::Value::String(font))
                .context("RSVP_FONT must be one of sans, serif, mono")?;
    }
    Ok(settings)
}
