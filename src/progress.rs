use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Snapshot of an in-flight render pass.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderStatus {
    pub timestamp: String,
    pub frames_rendered: u64,
    pub total_frames: u64,
    pub progress_pct: f64,
    pub elapsed_secs: f64,
    pub render_fps: f64,
    pub eta_secs: f64,
    // Signal state at the last rendered frame
    pub telemetry_t: f64,
    pub g_max: f64,
    pub complete: bool,
}

impl RenderStatus {
    pub fn compute(frames_rendered: u64, total_frames: u64, elapsed_secs: f64) -> Self {
        let progress_pct = if total_frames == 0 {
            0.0
        } else {
            frames_rendered as f64 / total_frames as f64 * 100.0
        };
        let render_fps = if elapsed_secs > 0.0 {
            frames_rendered as f64 / elapsed_secs
        } else {
            0.0
        };
        let eta_secs = if render_fps > 0.0 {
            total_frames.saturating_sub(frames_rendered) as f64 / render_fps
        } else {
            0.0
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            frames_rendered,
            total_frames,
            progress_pct,
            elapsed_secs,
            render_fps,
            eta_secs,
            telemetry_t: 0.0,
            g_max: 0.0,
            complete: false,
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Emits a `RenderStatus` roughly once per second of video.
pub struct RenderProgress {
    total_frames: u64,
    report_every: u64,
    start: Instant,
    status_file: Option<PathBuf>,
}

impl RenderProgress {
    pub fn new(total_frames: u64, fps: f64, status_file: Option<PathBuf>) -> Self {
        Self {
            total_frames,
            report_every: (fps.round() as u64).max(1),
            start: Instant::now(),
            status_file,
        }
    }

    pub fn report_every(&self) -> u64 {
        self.report_every
    }

    /// Call after each written frame. Returns the status when one was emitted.
    pub fn record(&mut self, frames_rendered: u64, telemetry_t: f64, g_max: f64) -> Option<RenderStatus> {
        if frames_rendered == 0 || frames_rendered % self.report_every != 0 {
            return None;
        }
        let status = self.snapshot(frames_rendered, telemetry_t, g_max, false);
        info!(
            "Rendering: {:6.2}% | {}/{} frames | {:5.1} fps | ETA: {:6.1}s",
            status.progress_pct, status.frames_rendered, status.total_frames, status.render_fps, status.eta_secs
        );
        self.publish(&status);
        Some(status)
    }

    pub fn finish(&mut self, frames_rendered: u64, telemetry_t: f64, g_max: f64) -> RenderStatus {
        let status = self.snapshot(frames_rendered, telemetry_t, g_max, true);
        info!(
            "Rendered {} frames in {:.1}s ({:.1} fps)",
            status.frames_rendered, status.elapsed_secs, status.render_fps
        );
        if self.total_frames > 0 && frames_rendered < self.total_frames {
            warn!(
                "Input ended after {} of {} advertised frames",
                frames_rendered, self.total_frames
            );
        }
        self.publish(&status);
        status
    }

    fn snapshot(&self, frames_rendered: u64, telemetry_t: f64, g_max: f64, complete: bool) -> RenderStatus {
        let elapsed = self.start.elapsed().as_secs_f64();
        let mut status = RenderStatus::compute(frames_rendered, self.total_frames, elapsed);
        status.telemetry_t = telemetry_t;
        status.g_max = g_max;
        status.complete = complete;
        status
    }

    fn publish(&self, status: &RenderStatus) {
        if let Some(path) = self.status_file.as_ref() {
            if let Err(e) = status.save(path) {
                warn!("Failed to write status file {}: {}", path.display(), e);
            }
        }
    }
}
