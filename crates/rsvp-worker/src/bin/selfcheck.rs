//! Environment selfcheck: verifies the worker can actually run here.

use std::path::Path;

use rsvp_media::font::find_font_file;
use rsvp_models::FontFamily;
use rsvp_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env();

    println!(
        "rsvp-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_ffmpeg()?;
    ensure_fonts(config.font_dir.as_deref())?;

    println!("rsvp-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_ffmpeg() -> anyhow::Result<()> {
    rsvp_media::check_ffmpeg().map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

fn ensure_fonts(font_dir: Option<&Path>) -> anyhow::Result<()> {
    for family in [FontFamily::Sans, FontFamily::Serif, FontFamily::Mono] {
        if find_font_file(family, font_dir).is_none() {
            return Err(anyhow::anyhow!(
                "no font file found for family '{family}'; install DejaVu or set RSVP_FONT_DIR"
            ));
        }
    }
    Ok(())
}
