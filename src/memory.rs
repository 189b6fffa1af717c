//! In-memory video collaborators for tests and debugging. No `ffmpeg` involved.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    error::{FilterError, FilterResult},
    frame::Frame,
    media::{AudioMuxer, FrameSink, FrameSource, StreamInfo, VideoBackend},
};

/// Plays back a fixed list of frames.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<Frame>,
    cursor: usize,
    info: StreamInfo,
    fail_at: Option<usize>,
    rewinds: usize,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>, frame_rate: f32) -> Self {
        let (width, height) = frames.first().map(Frame::dims).unwrap_or_default();
        Self {
            frames,
            cursor: 0,
            info: StreamInfo {
                frame_rate,
                width,
                height,
            },
            fail_at: None,
            rewinds: 0,
        }
    }

    /// Reports `info` instead of the size and rate of the first frame.
    pub fn with_info(mut self, info: StreamInfo) -> Self {
        self.info = info;
        self
    }

    /// Makes reading frame `index` fail with a decode error.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self) -> FilterResult<Option<Frame>> {
        if self.fail_at == Some(self.cursor) {
            return Err(FilterError::decode(format!(
                "corrupt frame {}",
                self.cursor
            )));
        }

        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> FilterResult<()> {
        self.cursor = 0;
        self.rewinds += 1;
        Ok(())
    }
}

/// Collects written frames into a shared buffer. An empty file is created at the sink path
/// so callers can observe its lifetime on disk.
#[derive(Debug)]
pub struct MemorySink {
    frames: Arc<Mutex<Vec<Frame>>>,
    finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> FilterResult<()> {
        if self.finished {
            return Err(FilterError::encode("sink is already finished"));
        }
        self.frames
            .lock()
            .map_err(|_| FilterError::encode("frame buffer poisoned"))?
            .push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> FilterResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Serves registered clips by path and records everything written to its sinks.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    clips: HashMap<PathBuf, MemorySource>,
    written: Arc<Mutex<Vec<Frame>>>,
    sinks: Arc<Mutex<Vec<(PathBuf, StreamInfo)>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, path: impl Into<PathBuf>, source: MemorySource) -> Self {
        self.clips.insert(path.into(), source);
        self
    }

    /// Every frame written so far, across all sinks.
    pub fn written(&self) -> Vec<Frame> {
        self.written.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn sink_paths(&self) -> Vec<PathBuf> {
        self.sinks().into_iter().map(|(path, _)| path).collect()
    }

    /// Every sink opened so far with the stream info it was opened for.
    pub fn sinks(&self) -> Vec<(PathBuf, StreamInfo)> {
        self.sinks.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl VideoBackend for MemoryBackend {
    fn open_stream(&self, path: &Path) -> FilterResult<Box<dyn FrameSource>> {
        let source = self
            .clips
            .get(path)
            .cloned()
            .ok_or_else(|| FilterError::decode(format!("{}: no such clip", path.display())))?;
        Ok(Box::new(source))
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo) -> FilterResult<Box<dyn FrameSink>> {
        fs::File::create(path)?;
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.push((path.to_path_buf(), *info));
        }
        Ok(Box::new(MemorySink {
            frames: Arc::clone(&self.written),
            finished: false,
        }))
    }
}

/// Copies the video-only file to the output, or fails on demand.
#[derive(Debug, Default, Clone)]
pub struct MemoryMuxer {
    fail: bool,
}

impl MemoryMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl AudioMuxer for MemoryMuxer {
    fn mux(&self, video_only: &Path, original: &Path, output: &Path) -> FilterResult<()> {
        if self.fail {
            return Err(FilterError::mux(format!(
                "could not combine {} with audio from {}",
                video_only.display(),
                original.display()
            )));
        }
        fs::copy(video_only, output)?;
        Ok(())
    }
}
