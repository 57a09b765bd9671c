use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use gforce_overlay::video::{VideoReader, VideoSink};
use gforce_overlay::{render_pass, FrameSource, OverlayConfig, RenderProgress, RenderSession, TelemetrySeries};

#[derive(Parser, Debug)]
#[command(name = "gforce_overlay")]
#[command(about = "Overlay a g-circle from a telemetry log onto a driving video", long_about = None)]
struct Args {
    /// JSON config file (any subset of fields; the rest use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Telemetry CSV (.csv or .csv.gz)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Input video
    #[arg(long)]
    video: Option<PathBuf>,

    /// Output video
    #[arg(long)]
    output: Option<PathBuf>,

    /// Clock skew correction in seconds (telemetry time = video time + offset)
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Telemetry timestamp of the first video frame; default assumes the
    /// video ends at the last telemetry sample
    #[arg(long, allow_hyphen_values = true)]
    video_start: Option<f64>,

    /// Smoothing factor in (0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Trail length in frames
    #[arg(long)]
    trail_length: Option<usize>,

    /// Pin the g range to the default instead of auto scaling
    #[arg(long, default_value_t = false)]
    no_auto_scale: bool,

    /// Skip the numeric readout in the top-left corner
    #[arg(long, default_value_t = false)]
    no_hud: bool,

    /// Write render progress as JSON to this file
    #[arg(long)]
    status_file: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<OverlayConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => OverlayConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => OverlayConfig::default(),
        };
        if let Some(csv) = self.csv {
            config.csv_path = csv;
        }
        if let Some(video) = self.video {
            config.video_path = video;
        }
        if let Some(output) = self.output {
            config.output_video = output;
        }
        if let Some(offset) = self.offset {
            config.alignment.time_offset = offset;
        }
        if self.video_start.is_some() {
            config.alignment.video_start = self.video_start;
        }
        if let Some(alpha) = self.alpha {
            config.smooth_alpha = alpha;
        }
        if let Some(trail) = self.trail_length {
            config.circle.trail_length = trail;
        }
        if self.no_auto_scale {
            config.scale.auto = false;
        }
        if self.no_hud {
            config.hud = false;
        }
        if self.status_file.is_some() {
            config.status_file = self.status_file;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    info!("Telemetry: {}", config.csv_path.display());
    info!("Video: {}", config.video_path.display());
    info!("Output: {}", config.output_video.display());

    let series = TelemetrySeries::load(&config.csv_path, &config.channels)
        .with_context(|| format!("loading telemetry {}", config.csv_path.display()))?;
    let mut source = VideoReader::open(&config.video_path)?;
    let geometry = source.geometry();
    let mut sink = VideoSink::create(&config.output_video, &geometry)?;

    let mut session = RenderSession::new(&config, series, &geometry)?;
    let mut progress = RenderProgress::new(geometry.frame_count, geometry.fps, config.status_file.clone());

    let summary = render_pass(&mut source, &mut sink, &mut session, &mut progress)?;

    info!(
        "Saved: {} ({} frames, final range {:.2} g)",
        config.output_video.display(),
        summary.frames_rendered,
        summary.final_g_max
    );
    Ok(())
}
