//! Replay the alignment and conditioning stages without touching any video.
//!
//! Useful for picking `--offset`: prints, as JSON, what every Nth frame would
//! resolve to and how much of the pass falls outside the telemetry span.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::json;

use gforce_overlay::{
    BinarySearchResolver, FrameOverlay, GTier, OverlayConfig, RenderSession, RollingCursor, SampleResolver,
    TelemetrySeries, VideoGeometry,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Resolver {
    Rolling,
    Search,
}

#[derive(Parser, Debug)]
struct Args {
    /// Telemetry CSV (.csv or .csv.gz)
    #[arg(long)]
    csv: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Video frame rate
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Number of video frames
    #[arg(long)]
    frames: u64,

    /// Clock skew correction in seconds
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Telemetry timestamp of frame 0 (default: video ends at the last sample)
    #[arg(long, allow_hyphen_values = true)]
    video_start: Option<f64>,

    /// Emit every Nth frame
    #[arg(long, default_value = "30")]
    every: u64,

    /// Time-to-sample resolution strategy
    #[arg(long, value_enum, default_value = "rolling")]
    resolver: Resolver,
}

#[derive(Default)]
struct TierCounts {
    safe: u64,
    caution: u64,
    critical: u64,
}

fn replay<R: SampleResolver>(
    args: &Args,
    config: &OverlayConfig,
    series: TelemetrySeries,
    resolver: R,
) -> Result<serde_json::Value> {
    let geometry = VideoGeometry {
        // Only the timing matters here
        width: 1920,
        height: 1080,
        fps: args.fps,
        frame_count: args.frames,
    };
    let mut session = RenderSession::with_resolver(config, series, &geometry, resolver)?;

    let start = session.series().start_time();
    let end = session.series().end_time();
    let video_start = session.mapper().video_start();
    let offset = session.mapper().time_offset();

    let mut emitted: Vec<FrameOverlay> = Vec::new();
    let mut tiers = TierCounts::default();
    let mut clamped_frames = 0u64;
    let mut distinct_samples = 0u64;
    let mut last_idx: Option<usize> = None;
    let mut peak_g_max: f64 = 0.0;
    let mut peak_load: f64 = 0.0;
    let every = args.every.max(1);

    for frame in 0..args.frames {
        let overlay = session.condition(frame)?;

        let unclamped = video_start + frame as f64 / args.fps + offset;
        if unclamped < start || unclamped > end {
            clamped_frames += 1;
        }
        if last_idx != Some(overlay.sample_index) {
            distinct_samples += 1;
            last_idx = Some(overlay.sample_index);
        }
        match overlay.tier {
            GTier::Safe => tiers.safe += 1,
            GTier::Caution => tiers.caution += 1,
            GTier::Critical => tiers.critical += 1,
        }
        peak_g_max = peak_g_max.max(overlay.g_max);
        peak_load = peak_load.max(overlay.smooth_lat.abs().max(overlay.smooth_long.abs()));

        if frame % every == 0 {
            emitted.push(overlay);
        }
    }

    Ok(json!({
        "csv": args.csv.display().to_string(),
        "resolver": format!("{:?}", args.resolver).to_lowercase(),
        "fps": args.fps,
        "frames": args.frames,
        "telemetry_start": start,
        "telemetry_end": end,
        "telemetry_samples": session.series().len(),
        "video_start": video_start,
        "time_offset": offset,
        "clamped_frames": clamped_frames,
        "distinct_samples": distinct_samples,
        "peak_load_g": peak_load,
        "peak_g_max": peak_g_max,
        "tiers": {
            "safe": tiers.safe,
            "caution": tiers.caution,
            "critical": tiers.critical,
        },
        "frames_sampled": emitted,
    }))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let mut config = match args.config.as_ref() {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };
    if let Some(offset) = args.offset {
        config.alignment.time_offset = offset;
    }
    if args.video_start.is_some() {
        config.alignment.video_start = args.video_start;
    }

    let series = TelemetrySeries::load(&args.csv, &config.channels)?;
    let report = match args.resolver {
        Resolver::Rolling => replay(&args, &config, series, RollingCursor::new())?,
        Resolver::Search => replay(&args, &config, series, BinarySearchResolver)?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
