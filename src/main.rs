mod analyser;
mod config;
mod controller;
mod decode;
mod driver;
mod encode;
mod error;
mod geometry;
mod graph;
mod history;
mod logging;
mod scheduler;
mod spectrum;
mod surface;
mod transport;
mod waveform;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use analyser::AnalyserSettings;
use config::RenderConfig;
use controller::LoopController;
use decode::{check_audio_file, decode_file};
use driver::drive;
use encode::{ffmpeg_available, mux, render_soundtrack, write_wav};
use graph::OfflineGraphBuilder;
use scheduler::VsyncScheduler;
use surface::{Color, ImageSurface};
use transport::HostClock;

#[derive(Parser, Debug)]
#[command(name = "audio-visualizer")]
#[command(about = "Render a scrolling waveform and rotating spectrum video (MP4) from an audio file")]
struct Args {
    /// Input audio file
    input: PathBuf,

    /// Output MP4 file
    #[arg(short, long)]
    output: PathBuf,

    /// TOML file with render settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolution (e.g. 300x500). Overrides --width / --height when set
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Canvas width (pixels)
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height (pixels)
    #[arg(long)]
    height: Option<u32>,

    /// Display refresh rate (fps)
    #[arg(long)]
    fps: Option<u32>,

    /// Press play/pause at this host time in seconds (repeatable)
    #[arg(long = "toggle-at", value_name = "SECS", value_parser = parse_seconds)]
    toggle_at: Vec<f64>,

    /// Keep the rendered PNG frames next to the output
    #[arg(long)]
    keep_frames: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err("resolution must be WIDTHxHEIGHT (e.g. 300x500)".to_string());
    }
    let w: u32 = parts[0].trim().parse().map_err(|_| "invalid width")?;
    let h: u32 = parts[1].trim().parse().map_err(|_| "invalid height")?;
    if w == 0 || h == 0 {
        return Err("width and height must be positive".to_string());
    }
    Ok((w, h))
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.trim().parse().map_err(|_| format!("invalid time: {}", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err("time must be a finite, non-negative number of seconds".to_string());
    }
    Ok(secs)
}

/// Defaults, then the config file, then command-line overrides.
fn resolve_config(args: &Args) -> anyhow::Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }
    if let Some((width, height)) = args.resolution {
        config.canvas.width = width;
        config.canvas.height = height;
    }
    if let Some(fps) = args.fps {
        config.canvas.fps = fps;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose)?;

    let config = resolve_config(&args)?;
    tracing::debug!("render config: {:?}", config);

    if let Err(notice) = check_audio_file(&args.input) {
        tracing::warn!("{}", notice);
        println!("{}", notice);
        return Ok(());
    }
    if !ffmpeg_available() {
        bail!("ffmpeg not found. Please install ffmpeg and add it to your PATH.");
    }

    println!("Decoding: {:?}", args.input);
    let decoded = decode_file(&args.input)
        .with_context(|| format!("decoding {}", args.input.display()))?;
    let duration = decoded.duration_secs();
    println!(
        "Decoded {} samples at {} Hz ({:.2}s)",
        decoded.samples.len(),
        decoded.sample_rate,
        duration
    );

    let clock = HostClock::new();
    let builder = OfflineGraphBuilder::new(
        clock.clone(),
        AnalyserSettings {
            time_buffer_length: config.waveform.samples_per_frame,
            fft_size: config.spectrum.fft_size,
            smoothing: config.spectrum.smoothing,
            min_db: config.spectrum.min_db,
            max_db: config.spectrum.max_db,
        },
    );
    let mut controller = LoopController::new(&config, builder, VsyncScheduler::new());
    controller.load_source(decoded.clone())?;

    let temp_dir = std::env::temp_dir().join(format!("audio-visualizer-{}", std::process::id()));
    let frames_dir = temp_dir.join("frames");
    std::fs::create_dir_all(&frames_dir)
        .with_context(|| format!("creating {}", frames_dir.display()))?;
    let wav_path = temp_dir.join("audio.wav");

    let fps = config.canvas.fps;
    let estimate = (duration * fps as f64).ceil().max(1.0) as u64;
    let pb_render = ProgressBar::new(estimate);
    pb_render.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames")?
            .progress_chars("=>-"),
    );

    let mut surface = ImageSurface::new(
        config.canvas.width,
        config.canvas.height,
        Color::from(config.canvas.background),
    );
    let frames = drive(
        &mut controller,
        &clock,
        &mut surface,
        duration,
        fps,
        &args.toggle_at,
        |index, canvas| {
            canvas.save(&frames_dir.join(format!("frame_{:06}.png", index)))?;
            if index >= pb_render.length().unwrap_or(0) {
                pb_render.set_length(index + 1);
            }
            pb_render.inc(1);
            Ok(())
        },
    )?;
    controller.shutdown();
    pb_render.finish_with_message("Rendering done");

    if frames.is_empty() {
        bail!("nothing was rendered; is the input empty?");
    }

    let soundtrack = render_soundtrack(&decoded.samples, decoded.sample_rate, fps, &frames);
    println!("Writing WAV: {:?}", wav_path);
    write_wav(&wav_path, &soundtrack, decoded.sample_rate).context("writing soundtrack")?;

    let result = mux(&frames_dir, &wav_path, fps, &args.output, frames.len() as u64);

    let _ = std::fs::remove_file(&wav_path);
    if args.keep_frames {
        println!("Frames kept in {:?}", frames_dir);
    } else {
        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    result.context("encoding video")?;
    println!("Done: {:?}", args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, parse_resolution, parse_seconds, resolve_config};

    #[test]
    fn resolution_parses_width_and_height() {
        assert_eq!(parse_resolution("640x480"), Ok((640, 480)));
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("0x480").is_err());
        assert!(parse_resolution("axb").is_err());
    }

    #[test]
    fn toggle_times_must_be_finite_and_non_negative() {
        assert_eq!(parse_seconds("1.5"), Ok(1.5));
        assert_eq!(parse_seconds("0"), Ok(0.0));
        assert!(parse_seconds("NaN").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("-2").is_err());
        assert!(parse_seconds("soon").is_err());

        let rejected = Args::try_parse_from([
            "audio-visualizer",
            "song.mp3",
            "-o",
            "out.mp4",
            "--toggle-at",
            "inf",
        ]);
        assert!(rejected.is_err());
    }

    #[test]
    fn cli_overrides_defaults() {
        let args = Args::parse_from([
            "audio-visualizer",
            "song.mp3",
            "-o",
            "out.mp4",
            "--width",
            "400",
            "--fps",
            "30",
            "--toggle-at",
            "1.5",
            "--toggle-at",
            "3",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.canvas.width, 400);
        assert_eq!(config.canvas.height, 500);
        assert_eq!(config.canvas.fps, 30);
        assert_eq!(args.toggle_at, vec![1.5, 3.0]);
    }

    #[test]
    fn resolution_wins_over_width() {
        let args = Args::parse_from([
            "audio-visualizer",
            "song.mp3",
            "-o",
            "out.mp4",
            "--width",
            "400",
            "--resolution",
            "800x600",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!((config.canvas.width, config.canvas.height), (800, 600));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let args = Args::parse_from(["audio-visualizer", "song.mp3", "-o", "out.mp4", "--fps", "0"]);
        assert!(resolve_config(&args).is_err());
    }
}
