//! Encoder adapter: ordered frame stream -> H.264 MP4 via ffmpeg.
//!
//! Frames carry variable durations but the container is fixed-rate, so each
//! frame is expanded into `round(duration_ms / frame_period)` repeats
//! (minimum 1) and streamed to an external ffmpeg process as rawvideo on
//! stdin. Output goes to a temporary path and is renamed onto the artifact
//! path only after the encoder exits cleanly, so a caller never observes a
//! partially written file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::render::Frame;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;
/// Default x264 preset, matching interactive-latency encodes.
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF quality.
pub const DEFAULT_CRF: u8 = 23;

/// Encoder configuration.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Output frame rate
    pub fps: u32,
    /// x264 preset
    pub preset: String,
    /// Constant Rate Factor (quality, lower is better)
    pub crf: u8,
    /// How long to wait for ffmpeg to drain and exit after the last frame
    pub wait_timeout: Duration,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            wait_timeout: Duration::from_secs(300),
        }
    }
}

/// Number of fixed-rate frames a variable-duration frame expands into.
///
/// Pure transform, kept separate from the subprocess plumbing so pacing can
/// be tested without invoking an encoder.
pub fn expand_frame_count(duration_ms: u64, fps: u32) -> u64 {
    let exact = duration_ms as f64 * fps as f64 / 1000.0;
    (exact.round() as u64).max(1)
}

/// Ordered consumer of rendered frames.
///
/// Call order: `begin`, then `push_frame` for each unit in sequence, then
/// exactly one of `finish` (publish) or `abort` (discard).
pub trait FrameSink: Send {
    fn begin(&mut self, width: u32, height: u32) -> MediaResult<()>;
    fn push_frame(&mut self, frame: &Frame) -> MediaResult<()>;
    fn finish(&mut self) -> MediaResult<()>;
    fn abort(&mut self);
}

/// Creates one sink per job artifact.
pub trait SinkFactory: Send + Sync {
    fn create(&self, artifact_path: &Path) -> MediaResult<Box<dyn FrameSink>>;
}

/// Check that ffmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Build the ffmpeg argument list for a rawvideo-to-MP4 encode.
fn build_ffmpeg_args(config: &EncoderConfig, width: u32, height: u32, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-s".to_string(),
        format!("{width}x{height}"),
        "-r".to_string(),
        config.fps.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        config.preset.clone(),
        "-crf".to_string(),
        config.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Sink that streams raw RGB24 frames to a spawned ffmpeg process.
pub struct FfmpegSink {
    config: EncoderConfig,
    artifact_path: PathBuf,
    temp_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    /// Create a sink that will publish to `artifact_path` on success.
    pub fn new(config: EncoderConfig, artifact_path: impl Into<PathBuf>) -> Self {
        let artifact_path = artifact_path.into();
        let temp_path = temp_path_for(&artifact_path);
        Self {
            config,
            artifact_path,
            temp_path,
            child: None,
            stdin: None,
            stderr_drain: None,
            width: 0,
            height: 0,
        }
    }

    fn cleanup_temp(&self) {
        if self.temp_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                warn!("Failed to remove temp output {}: {e}", self.temp_path.display());
            }
        }
    }

    /// Wait for the child to exit, bounded by the configured drain timeout.
    fn wait_with_timeout(&mut self) -> MediaResult<std::process::ExitStatus> {
        let mut child = self
            .child
            .take()
            .ok_or(MediaError::SinkState("finish before begin"))?;

        let deadline = Instant::now() + self.config.wait_timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!(
                    "ffmpeg did not exit within {}s, killing process",
                    self.config.wait_timeout.as_secs()
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(MediaError::Timeout(self.config.wait_timeout.as_secs()));
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    fn drained_stderr(&mut self) -> Option<String> {
        let handle = self.stderr_drain.take()?;
        let bytes = handle.join().ok()?.ok()?;
        if bytes.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&bytes).trim().to_string())
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, width: u32, height: u32) -> MediaResult<()> {
        if self.child.is_some() {
            return Err(MediaError::SinkState("begin called twice"));
        }
        check_ffmpeg()?;

        if let Some(parent) = self.artifact_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = build_ffmpeg_args(&self.config, width, height, &self.temp_path);
        debug!("Spawning encoder: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or(MediaError::SinkState("ffmpeg stdin not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(MediaError::SinkState("ffmpeg stderr not captured"))?;

        self.stderr_drain = Some(std::thread::spawn(move || {
            use std::io::Read;
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        }));

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(MediaError::FrameSizeMismatch {
                got_width: frame.width(),
                got_height: frame.height(),
                want_width: self.width,
                want_height: self.height,
            });
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or(MediaError::SinkState("push_frame before begin"))?;

        let repeats = expand_frame_count(frame.duration_ms, self.config.fps);
        for _ in 0..repeats {
            stdin.write_all(frame.data()).map_err(|e| {
                MediaError::ffmpeg_failed(format!("failed to write frame to ffmpeg stdin: {e}"), None, None)
            })?;
        }
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        // Closing stdin signals end-of-stream to ffmpeg.
        drop(self.stdin.take());

        let status = match self.wait_with_timeout() {
            Ok(status) => status,
            Err(e) => {
                self.cleanup_temp();
                return Err(e);
            }
        };
        let stderr = self.drained_stderr();

        if !status.success() {
            self.cleanup_temp();
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                stderr,
                status.code(),
            ));
        }

        std::fs::rename(&self.temp_path, &self.artifact_path)?;
        debug!("Published artifact {}", self.artifact_path.display());
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.cleanup_temp();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // A sink dropped without finish() must not leave a subprocess or a
        // partial temp file behind.
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn temp_path_for(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    artifact_path.with_file_name(name)
}

/// Factory producing [`FfmpegSink`]s.
pub struct FfmpegSinkFactory {
    config: EncoderConfig,
}

impl FfmpegSinkFactory {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn create(&self, artifact_path: &Path) -> MediaResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(self.config.clone(), artifact_path)))
    }
}

/// In-memory sink recording per-frame expansion, for tests and debugging.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub fps: u32,
    pub begun: bool,
    pub finished: bool,
    pub aborted: bool,
    /// (duration_ms, expanded frame count) per pushed frame, in order.
    pub frames: Vec<(u64, u64)>,
}

impl MemorySink {
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            ..Default::default()
        }
    }
}

impl FrameSink for MemorySink {
    fn begin(&mut self, _width: u32, _height: u32) -> MediaResult<()> {
        self.begun = true;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        if !self.begun {
            return Err(MediaError::SinkState("push_frame before begin"));
        }
        self.frames
            .push((frame.duration_ms, expand_frame_count(frame.duration_ms, self.fps)));
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_frame_count() {
        // 200ms at 30fps = 6 frames
        assert_eq!(expand_frame_count(200, 30), 6);
        // 500ms at 30fps = 15 frames
        assert_eq!(expand_frame_count(500, 30), 15);
        // Sub-period durations still emit one frame
        assert_eq!(expand_frame_count(1, 30), 1);
        assert_eq!(expand_frame_count(0, 30), 1);
        // Rounds to nearest frame period: 50ms at 30fps = 1.5 -> 2
        assert_eq!(expand_frame_count(50, 30), 2);
    }

    #[test]
    fn test_build_args_shape() {
        let config = EncoderConfig::default();
        let args = build_ffmpeg_args(&config, 1920, 1080, Path::new("/tmp/out.mp4.tmp"));

        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"rgb24".to_string()));
        assert!(args.contains(&"1920x1080".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4.tmp");
    }

    #[test]
    fn test_temp_path_keeps_directory() {
        let temp = temp_path_for(Path::new("/data/jobs/abc/output.mp4"));
        assert_eq!(temp, Path::new("/data/jobs/abc/output.mp4.tmp"));
    }

    #[test]
    fn test_memory_sink_requires_begin() {
        let mut sink = MemorySink::new(30);
        let frame = Frame {
            image: image::RgbImage::new(2, 2),
            duration_ms: 100,
        };
        assert!(sink.push_frame(&frame).is_err());

        sink.begin(2, 2).unwrap();
        sink.push_frame(&frame).unwrap();
        assert_eq!(sink.frames, vec![(100, 3)]);
    }

    #[test]
    fn test_ffmpeg_sink_abort_removes_temp() {
        let dir = tempfile::TempDir::new().unwrap();
        let artifact = dir.path().join("output.mp4");
        let mut sink = FfmpegSink::new(EncoderConfig::default(), &artifact);

        // Simulate a partial encode without spawning anything.
        std::fs::write(&sink.temp_path, b"partial").unwrap();
        sink.abort();

        assert!(!sink.temp_path.exists());
        assert!(!artifact.exists());
    }
}
