use std::io::{stdout, Write};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use env_logger::Env;

use midiafilt::{
    cli::Args,
    ffmpeg::{FfmpegBackend, FfmpegMuxer},
    filter,
    media::FileImageCodec,
    Command, CommandOutcome, Engine, MediaKind, MediaPipeline,
};

fn print_catalog(engine: &Engine, kind: MediaKind) -> Result<()> {
    let frame = engine.current_frame()?;
    let (width, height) = frame.dims();
    println!("Filters for {kind:?} input ({width}x{height}):");

    for name in engine.session().list_filters(kind) {
        let spec = filter::lookup(name)?;
        let params: Vec<String> = spec
            .params
            .iter()
            .map(|p| format!("{}={} {}", p.name, p.default, p.bounds(frame)))
            .collect();
        println!("  {name:<22}{}", params.join("  "));
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.pipeline_config();

    let pipeline = MediaPipeline::new(
        Box::new(FileImageCodec),
        Box::new(FfmpegBackend::new(&config)),
        Box::new(FfmpegMuxer::new(&config)),
        config.clone(),
    );
    let mut engine = Engine::new(pipeline);
    let kind = engine
        .open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    if args.list {
        return print_catalog(&engine, kind);
    }

    match &args.filter {
        Some(name) => {
            engine.dispatch(Command::SelectFilter(name.clone()))?;
        }
        None if !args.params.is_empty() || !args.steps.is_empty() => {
            bail!("--param and --step need a --filter to apply to");
        }
        None => {}
    }

    let selected = engine.session().selected().unwrap_or_default();
    for (param, value) in &args.params {
        let outcome = engine.dispatch(Command::SetParam {
            filter: selected.to_string(),
            param: param.clone(),
            value: *value,
        })?;
        if let CommandOutcome::ParamStored(stored) = outcome {
            if stored != *value {
                println!("{selected}.{param} clamped to {stored}");
            }
        }
    }
    for (param, direction) in &args.steps {
        engine.dispatch(Command::StepParam {
            filter: selected.to_string(),
            param: param.clone(),
            direction: *direction,
        })?;
    }

    if let Some(frames) = args.preview {
        if kind != MediaKind::Video {
            bail!("--preview needs a video input");
        }

        let shown = engine
            .preview(frames, config.preview_interval, |frame| {
                let (width, height) = frame.dims();
                print!("\rPreview {width}x{height}...");
                let _ = stdout().flush();
            })
            .await?;
        println!("\rPreviewed {shown} frames");
        return Ok(());
    }

    let destination = args
        .output
        .clone()
        .ok_or_else(|| anyhow!("--output is required unless --list or --preview is given"))?;
    let command = match kind {
        MediaKind::Image => Command::ExportImage {
            destination: destination.clone(),
            preset: args.preset,
        },
        MediaKind::Video => Command::ExportVideo {
            destination: destination.clone(),
            preset: args.preset,
        },
    };

    if let CommandOutcome::Exported(report) = engine.dispatch(command)? {
        println!(
            "Exported {} frame(s) to {}",
            report.frames,
            destination.display()
        );
    }

    Ok(())
}
