//! Pixel filters for images and videos with frame-aware parameter bounds.
//!
//! A [`Session`] holds the selected catalog filter and every filter's parameter values,
//! clamped against the current frame. A [`MediaPipeline`] runs the session over a single
//! image or a whole video and hands the result to an audio muxer.

pub mod cli;
pub mod command;
pub mod error;
pub mod ffmpeg;
pub mod filter;
pub mod frame;
pub mod media;
pub mod memory;
pub mod params;
pub mod pipeline;
pub mod preview;
pub mod session;

pub use command::{Command, CommandOutcome, Engine};
pub use error::{FilterError, FilterResult};
pub use filter::{catalog, list_filters, lookup, FilterDescriptor, MediaCapability, Preset};
pub use frame::Frame;
pub use media::MediaKind;
pub use params::{Bound, Direction, ParamDescriptor, ResolvedBounds};
pub use pipeline::{ExportReport, MediaPipeline, PipelineConfig};
pub use preview::Preview;
pub use session::Session;
