//! Seams to the outside world: image codecs, sequential video sources and sinks, and the
//! audio muxer. The engine only talks to these traits; `ffmpeg` and the `image` crate
//! provide the concrete implementations.

use std::path::Path;

use crate::{
    error::{FilterError, FilterResult},
    frame::Frame,
};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub frame_rate: f32,
    pub width: usize,
    pub height: usize,
}

pub trait ImageCodec {
    fn decode(&self, path: &Path) -> FilterResult<Frame>;
    fn encode(&self, frame: &Frame, path: &Path) -> FilterResult<()>;
}

/// Sequential reader over a video's frames.
pub trait FrameSource {
    fn info(&self) -> StreamInfo;

    /// `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> FilterResult<Option<Frame>>;

    /// Seeks back to the first frame.
    fn rewind(&mut self) -> FilterResult<()>;
}

pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> FilterResult<()>;

    /// Flushes and closes the sink. No frames may follow.
    fn finish(&mut self) -> FilterResult<()>;
}

pub trait VideoBackend {
    fn open_stream(&self, path: &Path) -> FilterResult<Box<dyn FrameSource>>;

    /// Opens a video-only sink at `path` matching `info`.
    fn open_sink(&self, path: &Path, info: &StreamInfo) -> FilterResult<Box<dyn FrameSink>>;
}

pub trait AudioMuxer {
    /// Writes `output` with the video track of `video_only` copied untouched and the
    /// audio track (if any) of `original`.
    fn mux(&self, video_only: &Path, original: &Path, output: &Path) -> FilterResult<()>;
}

/// Still images through the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageCodec;

impl ImageCodec for FileImageCodec {
    fn decode(&self, path: &Path) -> FilterResult<Frame> {
        let img = image::open(path)
            .map_err(|e| FilterError::decode(format!("{}: {e}", path.display())))?;
        Frame::from_rgb_image(&img.to_rgb8())
    }

    fn encode(&self, frame: &Frame, path: &Path) -> FilterResult<()> {
        frame
            .to_rgb_image()
            .save(path)
            .map_err(|e| FilterError::encode(format!("{}: {e}", path.display())))
    }
}
