//! Front-end intents dispatched into the session and the media pipeline.

use std::{ops::ControlFlow, path::PathBuf, time::Duration};

use log::info;

use crate::{
    error::{FilterError, FilterResult},
    filter::Preset,
    frame::Frame,
    media::MediaKind,
    params::Direction,
    pipeline::{ExportReport, MediaPipeline},
    session::Session,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectFilter(String),
    SetParam {
        filter: String,
        param: String,
        value: i32,
    },
    StepParam {
        filter: String,
        param: String,
        direction: Direction,
    },
    /// Renders the current frame through a preset.
    ApplyPreset(Preset),
    /// Exports the open image. With a preset the preset replaces the active filter.
    ExportImage {
        destination: PathBuf,
        preset: Option<Preset>,
    },
    ExportVideo {
        destination: PathBuf,
        preset: Option<Preset>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Selected(&'static str),
    /// The value actually stored after clamping.
    ParamStored(i32),
    Rendered(Frame),
    Exported(ExportReport),
}

/// The single session plus the pipeline holding the current source.
pub struct Engine {
    session: Session,
    pipeline: MediaPipeline,
}

impl Engine {
    pub fn new(pipeline: MediaPipeline) -> Self {
        Self {
            session: Session::new(),
            pipeline,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pipeline(&self) -> &MediaPipeline {
        &self.pipeline
    }

    pub fn open(&mut self, path: impl Into<PathBuf>) -> FilterResult<MediaKind> {
        self.pipeline.open(&path.into())
    }

    pub fn current_frame(&self) -> FilterResult<&Frame> {
        self.pipeline
            .current_frame()
            .ok_or(FilterError::NoMediaOpen)
    }

    pub fn dispatch(&mut self, command: Command) -> FilterResult<CommandOutcome> {
        match command {
            Command::SelectFilter(name) => self.session.select(&name).map(CommandOutcome::Selected),
            Command::SetParam {
                filter,
                param,
                value,
            } => {
                let frame = self
                    .pipeline
                    .current_frame()
                    .ok_or(FilterError::NoMediaOpen)?;
                self.session
                    .set_param(&filter, &param, value, frame)
                    .map(CommandOutcome::ParamStored)
            }
            Command::StepParam {
                filter,
                param,
                direction,
            } => {
                let frame = self
                    .pipeline
                    .current_frame()
                    .ok_or(FilterError::NoMediaOpen)?;
                self.session
                    .step(&filter, &param, direction, frame)
                    .map(CommandOutcome::ParamStored)
            }
            Command::ApplyPreset(preset) => {
                let frame = self.current_frame()?;
                self.session
                    .apply_preset(preset, frame)
                    .map(CommandOutcome::Rendered)
            }
            Command::ExportImage {
                destination,
                preset,
            } => self.export(MediaKind::Image, destination, preset),
            Command::ExportVideo {
                destination,
                preset,
            } => self.export(MediaKind::Video, destination, preset),
        }
    }

    fn export(
        &self,
        expected: MediaKind,
        destination: PathBuf,
        preset: Option<Preset>,
    ) -> FilterResult<CommandOutcome> {
        let (source, kind) = self.pipeline.source().ok_or(FilterError::NoMediaOpen)?;
        if kind != expected {
            return Err(FilterError::invalid_argument(format!(
                "cannot export {} as {expected:?}, it was opened as {kind:?}",
                source.display()
            )));
        }
        if preset.is_none() && self.session.selected().is_none() {
            return Err(FilterError::NoFilterSelected);
        }

        info!(
            "exporting with {}",
            preset
                .map(Preset::name)
                .or(self.session.selected())
                .unwrap_or_default()
        );

        let session = &self.session;
        let transform = |frame: &Frame| match preset {
            Some(preset) => session.apply_preset(preset, frame),
            None => session.apply(frame),
        };
        self.pipeline
            .export_current(&destination, transform)
            .map(CommandOutcome::Exported)
    }

    /// Loops the open video for up to `frames` frames. Errors with `NoMediaOpen` unless a
    /// video is open.
    pub async fn preview<F>(
        &mut self,
        frames: usize,
        period: Duration,
        mut on_frame: F,
    ) -> FilterResult<usize>
    where
        F: FnMut(&Frame),
    {
        let Self { session, pipeline } = self;
        let preview = pipeline.preview_mut().ok_or(FilterError::NoMediaOpen)?;
        if frames == 0 {
            return Ok(0);
        }

        let mut shown = 0;
        preview
            .run(session, period, |frame, _| {
                on_frame(frame);
                shown += 1;
                if shown >= frames {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await
    }
}
