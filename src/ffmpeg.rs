use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ChildStdin,
    thread::{self, JoinHandle},
};

use ffmpeg_sidecar::{
    child::FfmpegChild,
    command::FfmpegCommand,
    event::{FfmpegEvent, LogLevel},
    iter::FfmpegIterator,
};
use log::{debug, info, warn};

use crate::{
    error::{FilterError, FilterResult},
    frame::Frame,
    media::{AudioMuxer, FrameSink, FrameSource, StreamInfo, VideoBackend},
    pipeline::PipelineConfig,
};

const FALLBACK_FRAME_RATE: f32 = 30.0;

/// Decodes and encodes video through a system `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    video_codec: String,
}

impl FfmpegBackend {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            video_codec: config.video_codec.clone(),
        }
    }
}

impl VideoBackend for FfmpegBackend {
    fn open_stream(&self, path: &Path) -> FilterResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegSource::open(&self.ffmpeg, path)?))
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo) -> FilterResult<Box<dyn FrameSink>> {
        let sink = FfmpegSink::open(&self.ffmpeg, path, info, &self.video_codec)?;
        Ok(Box::new(sink))
    }
}

/// Kills `child` and reaps it. An already exited child only needs the wait.
fn stop(child: &mut FfmpegChild) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_decoder(ffmpeg: &Path, path: &Path) -> FilterResult<(FfmpegChild, FfmpegIterator)> {
    let mut child = FfmpegCommand::new_with_path(ffmpeg)
        .hide_banner()
        .input(&*path.to_string_lossy())
        .rawvideo()
        .spawn()
        .map_err(|e| FilterError::decode(format!("failed to spawn ffmpeg: {e}")))?;
    match child.iter() {
        Ok(events) => Ok((child, events)),
        Err(e) => {
            stop(&mut child);
            Err(FilterError::decode(format!(
                "failed to read ffmpeg output: {e}"
            )))
        }
    }
}

/// Lines ffmpeg reported as errors.
fn collect_errors(events: FfmpegIterator) -> Vec<String> {
    events
        .filter_map(|event| match event {
            FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => {
                Some(msg)
            }
            _ => None,
        })
        .collect()
}

/// `rgb24` frames streamed from a spawned decoder.
pub struct FfmpegSource {
    ffmpeg: PathBuf,
    path: PathBuf,
    child: FfmpegChild,
    events: FfmpegIterator,
    info: StreamInfo,
    pending: Option<Frame>,
}

impl FfmpegSource {
    pub fn open(ffmpeg: &Path, path: &Path) -> FilterResult<Self> {
        let (mut child, mut events) = spawn_decoder(ffmpeg, path)?;
        let mut info = None;
        let mut pending = None;

        for event in events.by_ref() {
            match event {
                FfmpegEvent::ParsedInputStream(stream) => {
                    if let Some(video) = stream.video_data() {
                        info.get_or_insert(StreamInfo {
                            frame_rate: video.fps,
                            width: video.width as usize,
                            height: video.height as usize,
                        });
                    }
                }
                FfmpegEvent::OutputFrame(frame) => {
                    let decoded = Frame::from_rgb_bytes(
                        frame.width as usize,
                        frame.height as usize,
                        frame.data,
                    );
                    match decoded {
                        Ok(frame) => pending = Some(frame),
                        Err(e) => {
                            stop(&mut child);
                            return Err(e);
                        }
                    }
                    break;
                }
                FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Fatal, msg) => {
                    stop(&mut child);
                    return Err(FilterError::decode(format!("{}: {msg}", path.display())));
                }
                _ => {}
            }
        }

        // Decoded frames are already rotated, so their size wins over the coded size.
        let info = match (info, &pending) {
            (Some(info), Some(frame)) => StreamInfo {
                width: frame.width(),
                height: frame.height(),
                ..info
            },
            (Some(info), None) => info,
            (None, Some(frame)) => {
                warn!(
                    "{}: no stream metadata, assuming {FALLBACK_FRAME_RATE} fps",
                    path.display()
                );
                StreamInfo {
                    frame_rate: FALLBACK_FRAME_RATE,
                    width: frame.width(),
                    height: frame.height(),
                }
            }
            (None, None) => {
                stop(&mut child);
                return Err(FilterError::decode(format!(
                    "{}: no video stream found",
                    path.display()
                )))
            }
        };

        debug!(
            "opened {} ({}x{} @ {} fps)",
            path.display(),
            info.width,
            info.height,
            info.frame_rate
        );

        Ok(Self {
            ffmpeg: ffmpeg.to_path_buf(),
            path: path.to_path_buf(),
            child,
            events,
            info,
            pending,
        })
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self) -> FilterResult<Option<Frame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }

        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    return Frame::from_rgb_bytes(
                        frame.width as usize,
                        frame.height as usize,
                        frame.data,
                    )
                    .map(Some);
                }
                FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Fatal, msg) => {
                    return Err(FilterError::decode(format!(
                        "{}: {msg}",
                        self.path.display()
                    )));
                }
                _ => {}
            }
        }

        Ok(None)
    }

    fn rewind(&mut self) -> FilterResult<()> {
        stop(&mut self.child);
        let (child, events) = spawn_decoder(&self.ffmpeg, &self.path)?;
        self.child = child;
        self.events = events;
        self.pending = None;
        Ok(())
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        stop(&mut self.child);
    }
}

/// Video-only encoder fed `bgr24` frames over stdin. Its log output is drained on a
/// separate thread so a chatty encoder never blocks on a full stderr pipe.
pub struct FfmpegSink {
    path: PathBuf,
    child: Option<FfmpegChild>,
    stdin: Option<ChildStdin>,
    errors: Option<JoinHandle<Vec<String>>>,
}

impl FfmpegSink {
    pub fn open(
        ffmpeg: &Path,
        path: &Path,
        info: &StreamInfo,
        video_codec: &str,
    ) -> FilterResult<Self> {
        let mut child = FfmpegCommand::new_with_path(ffmpeg)
            .hide_banner()
            .args(["-f", "rawvideo", "-pix_fmt", "bgr24"])
            .arg("-s")
            .arg(format!("{}x{}", info.width, info.height))
            .arg("-r")
            .arg(info.frame_rate.to_string())
            .input("-")
            .args(["-an", "-c:v", video_codec])
            .overwrite()
            .output(&*path.to_string_lossy())
            .spawn()
            .map_err(|e| FilterError::encode(format!("failed to spawn ffmpeg: {e}")))?;

        let Some(stdin) = child.take_stdin() else {
            stop(&mut child);
            return Err(FilterError::encode("failed to open ffmpeg stdin"));
        };
        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                stop(&mut child);
                return Err(FilterError::encode(format!(
                    "failed to read ffmpeg output: {e}"
                )));
            }
        };
        let errors = thread::spawn(move || collect_errors(events));

        debug!("encoding {} with {video_codec}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            child: Some(child),
            stdin: Some(stdin),
            errors: Some(errors),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> FilterResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| FilterError::encode("ffmpeg sink is already finished"))?;
        stdin
            .write_all(&frame.to_bgr_bytes())
            .map_err(|e| FilterError::encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(&mut self) -> FilterResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait()?;
        let errors = match self.errors.take().map(JoinHandle::join) {
            Some(Ok(errors)) => errors,
            Some(Err(_)) => vec!["ffmpeg log reader panicked".to_string()],
            None => Vec::new(),
        };
        if !status.success() {
            return Err(FilterError::encode(format!(
                "ffmpeg exited with {status} writing {}: {}",
                self.path.display(),
                errors.join("; ")
            )));
        }

        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(child) = self.child.as_mut() {
            stop(child);
        }
    }
}

/// Copies the processed video track and takes the audio from the original source.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    ffmpeg: PathBuf,
    audio_codec: String,
}

impl FfmpegMuxer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            audio_codec: config.audio_codec.clone(),
        }
    }
}

impl AudioMuxer for FfmpegMuxer {
    fn mux(&self, video_only: &Path, original: &Path, output: &Path) -> FilterResult<()> {
        info!(
            "muxing {} with audio from {} into {}",
            video_only.display(),
            original.display(),
            output.display()
        );

        // Every processed frame is kept even when the audio track is shorter.
        let mut child = FfmpegCommand::new_with_path(&self.ffmpeg)
            .hide_banner()
            .input(&*video_only.to_string_lossy())
            .input(&*original.to_string_lossy())
            .args(["-map", "0:v:0", "-map", "1:a:0?", "-c:v", "copy", "-c:a"])
            .arg(&self.audio_codec)
            .overwrite()
            .output(&*output.to_string_lossy())
            .spawn()
            .map_err(|e| FilterError::mux(format!("failed to spawn ffmpeg: {e}")))?;

        let errors = match child.iter() {
            Ok(events) => collect_errors(events),
            Err(e) => {
                stop(&mut child);
                return Err(FilterError::mux(format!(
                    "failed to read ffmpeg output: {e}"
                )));
            }
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(FilterError::mux(format!(
                "ffmpeg exited with {status}: {}",
                errors.join("; ")
            )));
        }

        for msg in errors {
            warn!("ffmpeg: {msg}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn stopped_children_are_reaped() {
        use std::{fs, os::unix::fs::PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = dir.path().join("ffmpeg");
        fs::write(&ffmpeg, "#!/bin/sh\nexec sleep 30\n").unwrap();
        fs::set_permissions(&ffmpeg, fs::Permissions::from_mode(0o755)).unwrap();

        let mut running = FfmpegCommand::new_with_path(&ffmpeg).spawn().unwrap();
        let mut exited = FfmpegCommand::new_with_path("true").spawn().unwrap();
        let pids = [running.as_inner().id(), exited.as_inner().id()];

        std::thread::sleep(std::time::Duration::from_millis(100));
        stop(&mut running);
        stop(&mut exited);

        for pid in pids {
            let proc_dir = format!("/proc/{pid}");
            assert!(!Path::new(&proc_dir).exists(), "pid {pid} left behind");
        }
    }
}
