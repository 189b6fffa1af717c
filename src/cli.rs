use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{error::FilterError, filter::Preset, params::Direction, pipeline::PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "midiafilt",
    version,
    about = "Apply a pixel filter to an image or video"
)]
pub struct Args {
    /// The image or video to load
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to write the filtered result
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// The catalog filter to apply
    #[arg(short = 'f', long, value_name = "NAME")]
    pub filter: Option<String>,

    /// Sets a parameter of the selected filter, may be repeated
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, i32)>,

    /// Nudges a parameter of the selected filter by one, may be repeated
    #[arg(long = "step", value_name = "NAME=+|-", value_parser = parse_step)]
    pub steps: Vec<(String, Direction)>,

    /// Applies a fixed preset instead of the selected filter
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<Preset>,

    /// Prints the filters usable on the input with their bounds, then exits
    #[arg(long)]
    pub list: bool,

    /// Loops the video preview for <FRAMES> frames instead of exporting
    #[arg(long, value_name = "FRAMES")]
    pub preview: Option<usize>,

    /// Delay between preview frames
    #[arg(long, value_name = "MS", default_value_t = 5)]
    pub preview_interval_ms: u64,

    /// Encoder for the video-only intermediate file
    #[arg(long, value_name = "CODEC", default_value = "libx264")]
    pub video_codec: String,

    /// Encoder for the audio track of the final output
    #[arg(long, value_name = "CODEC", default_value = "aac")]
    pub audio_codec: String,

    /// The ffmpeg binary to run, instead of the one next to this executable or on PATH
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            preview_interval: Duration::from_millis(self.preview_interval_ms),
            ffmpeg_path: self.ffmpeg.clone().unwrap_or(defaults.ffmpeg_path),
            ..defaults
        }
    }
}

fn parse_param(s: &str) -> Result<(String, i32), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.to_string(), value))
}

fn parse_step(s: &str) -> Result<(String, Direction), String> {
    let (name, direction) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=+ or NAME=-, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let direction = direction.parse().map_err(|e: FilterError| e.to_string())?;
    Ok((name.to_string(), direction))
}
