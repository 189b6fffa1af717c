use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info, warn};

use crate::{
    error::{FilterError, FilterResult},
    frame::Frame,
    media::{AudioMuxer, FrameSink, FrameSource, ImageCodec, MediaKind, StreamInfo, VideoBackend},
    preview::Preview,
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The `ffmpeg` binary, next to the executable or on `PATH` by default.
    pub ffmpeg_path: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    /// Inserted before the extension of the destination to name the video-only file.
    pub intermediate_suffix: String,
    pub preview_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: ffmpeg_sidecar::paths::ffmpeg_path(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            intermediate_suffix: ".video-only".to_string(),
            preview_interval: Duration::from_millis(5),
        }
    }
}

/// What the pipeline currently holds.
pub enum MediaState {
    Idle,
    ImageReady { path: PathBuf, frame: Frame },
    VideoStreaming { path: PathBuf, preview: Preview },
}

impl std::fmt::Debug for MediaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaState::Idle => f.write_str("Idle"),
            MediaState::ImageReady { path, frame } => f
                .debug_struct("ImageReady")
                .field("path", path)
                .field("dims", &frame.dims())
                .finish(),
            MediaState::VideoStreaming { path, .. } => f
                .debug_struct("VideoStreaming")
                .field("path", path)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub frames: usize,
}

pub struct MediaPipeline {
    images: Box<dyn ImageCodec>,
    video: Box<dyn VideoBackend>,
    muxer: Box<dyn AudioMuxer>,
    config: PipelineConfig,
    state: MediaState,
}

impl MediaPipeline {
    pub fn new(
        images: Box<dyn ImageCodec>,
        video: Box<dyn VideoBackend>,
        muxer: Box<dyn AudioMuxer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            images,
            video,
            muxer,
            config,
            state: MediaState::Idle,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &MediaState {
        &self.state
    }

    /// Replaces the current source. An image is decoded once and held; a video is
    /// opened as a stream whose first frame becomes the current frame.
    pub fn open(&mut self, path: &Path) -> FilterResult<MediaKind> {
        let kind = MediaKind::from_path(path)
            .ok_or_else(|| FilterError::unsupported_media(path.display().to_string()))?;

        self.state = MediaState::Idle;
        self.state = match kind {
            MediaKind::Image => MediaState::ImageReady {
                path: path.to_path_buf(),
                frame: self.images.decode(path)?,
            },
            MediaKind::Video => MediaState::VideoStreaming {
                path: path.to_path_buf(),
                preview: Preview::start(self.video.open_stream(path)?)?,
            },
        };

        info!("opened {} as {kind:?}", path.display());
        Ok(kind)
    }

    pub fn source(&self) -> Option<(&Path, MediaKind)> {
        match &self.state {
            MediaState::Idle => None,
            MediaState::ImageReady { path, .. } => Some((path, MediaKind::Image)),
            MediaState::VideoStreaming { path, .. } => Some((path, MediaKind::Video)),
        }
    }

    /// The frame parameter bounds are resolved against.
    pub fn current_frame(&self) -> Option<&Frame> {
        match &self.state {
            MediaState::Idle => None,
            MediaState::ImageReady { frame, .. } => Some(frame),
            MediaState::VideoStreaming { preview, .. } => preview.current(),
        }
    }

    pub fn preview_mut(&mut self) -> Option<&mut Preview> {
        match &mut self.state {
            MediaState::VideoStreaming { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Decodes `source` once, transforms it and encodes it to `destination`.
    pub fn export_image<F>(
        &self,
        source: &Path,
        destination: &Path,
        transform: F,
    ) -> FilterResult<()>
    where
        F: Fn(&Frame) -> FilterResult<Frame>,
    {
        let frame = self.images.decode(source)?;
        let out = transform(&frame)?;
        self.images.encode(&out, destination)?;
        info!("exported image {}", destination.display());
        Ok(())
    }

    /// Transforms every frame of `source` in order into a video-only intermediate file,
    /// then muxes it with the original audio into `destination`. The intermediate file is
    /// removed whether or not muxing succeeds.
    ///
    /// The output stream takes its size from the first decoded frame, not the reported
    /// stream size, and every later frame must match it.
    pub fn export_video<F>(
        &self,
        source: &Path,
        destination: &Path,
        transform: F,
    ) -> FilterResult<ExportReport>
    where
        F: Fn(&Frame) -> FilterResult<Frame>,
    {
        let mut stream = self.video.open_stream(source)?;
        let first = stream.next_frame()?.ok_or_else(|| {
            FilterError::decode(format!("{}: no frames to export", source.display()))
        })?;
        let info = StreamInfo {
            width: first.width(),
            height: first.height(),
            ..stream.info()
        };
        let intermediate = intermediate_path(destination, &self.config.intermediate_suffix);
        info!(
            "exporting {} ({}x{} @ {} fps) to {}",
            source.display(),
            info.width,
            info.height,
            info.frame_rate,
            destination.display()
        );

        let mut sink = self.video.open_sink(&intermediate, &info)?;
        let pumped = pump(first, stream.as_mut(), sink.as_mut(), &transform);
        let frames = match pumped.and_then(|frames| sink.finish().map(|_| frames)) {
            Ok(frames) => frames,
            Err(e) => {
                drop(sink);
                remove_intermediate(&intermediate);
                return Err(e);
            }
        };
        drop(stream);
        info!("wrote {frames} frames to {}", intermediate.display());

        let muxed = self.muxer.mux(&intermediate, source, destination);
        remove_intermediate(&intermediate);
        muxed?;

        info!("exported video {}", destination.display());
        Ok(ExportReport { frames })
    }

    pub fn export_current<F>(&self, destination: &Path, transform: F) -> FilterResult<ExportReport>
    where
        F: Fn(&Frame) -> FilterResult<Frame>,
    {
        match self.source() {
            None => Err(FilterError::NoMediaOpen),
            Some((source, MediaKind::Image)) => self
                .export_image(source, destination, transform)
                .map(|_| ExportReport { frames: 1 }),
            Some((source, MediaKind::Video)) => self.export_video(source, destination, transform),
        }
    }
}

/// Applies `transform` to `first` and every remaining frame and writes them, stopping at
/// the first failure. Frames must keep the size of `first`.
fn pump<F>(
    first: Frame,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    transform: &F,
) -> FilterResult<usize>
where
    F: Fn(&Frame) -> FilterResult<Frame>,
{
    let (width, height) = first.dims();
    let mut frames = 0;
    let mut next = Some(first);

    while let Some(frame) = next {
        let out = transform(&frame)?;
        if out.dims() != (width, height) {
            let (w, h) = out.dims();
            return Err(FilterError::encode(format!(
                "frame {frames} is {w}x{h} but the output stream is {width}x{height}"
            )));
        }

        sink.write_frame(&out)?;
        frames += 1;
        debug!("processed frame {frames}");
        next = source.next_frame()?;
    }

    Ok(frames)
}

/// `out/clip.mp4` becomes `out/clip.video-only.mp4`.
pub fn intermediate_path(destination: &Path, suffix: &str) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = destination
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    destination.with_file_name(format!("{stem}{suffix}.{ext}"))
}

fn remove_intermediate(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_sits_next_to_destination() {
        assert_eq!(
            intermediate_path(Path::new("out/clip.mp4"), ".video-only"),
            PathBuf::from("out/clip.video-only.mp4")
        );
        assert_eq!(
            intermediate_path(Path::new("render"), ".tmp"),
            PathBuf::from("render.tmp.mp4")
        );
    }

    #[test]
    fn default_config_matches_cli_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.video_codec, "libx264");
        assert_eq!(config.audio_codec, "aac");
        assert_eq!(config.preview_interval, Duration::from_millis(5));
    }
}
