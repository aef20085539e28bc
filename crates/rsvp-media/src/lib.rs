//! Timing, frame rendering and video encoding for RSVP synthesis.
//!
//! This crate provides the three leaf components of the pipeline:
//! - Timing engine: text -> ordered display units with durations and ORP
//! - Frame renderer: display unit + settings -> deterministic 1920x1080 bitmap
//! - Encoder adapter: ordered frame stream -> H.264 MP4 via an external
//!   ffmpeg subprocess, published atomically

pub mod encode;
pub mod error;
pub mod font;
pub mod render;
pub mod timing;

pub use encode::{
    check_ffmpeg, expand_frame_count, EncoderConfig, FfmpegSink, FfmpegSinkFactory, FrameSink,
    MemorySink, SinkFactory,
};
pub use error::{MediaError, MediaResult};
pub use font::load_font;
pub use render::{Frame, FrameRenderer, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use timing::{segment, PauseConfig};
