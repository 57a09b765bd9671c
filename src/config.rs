//! Render configuration
//!
//! Every value is fixed for the duration of a pass. Defaults match the tuning
//! used on the reference recordings; a JSON file can override any subset and
//! the CLI can override that again.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OverlayError, OverlayResult};

/// Names of the CSV columns holding the telemetry channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    /// Timestamp column, milliseconds
    pub time: String,
    /// Longitudinal acceleration column, m/s²
    pub long: String,
    /// Lateral acceleration column, m/s²
    pub lat: String,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            time: "Time".to_string(),
            long: "imu.long".to_string(),
            lat: "imu.lat".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GCircleConfig {
    /// Distance of the circle centre from the right and bottom frame edges (px)
    pub margin: i32,
    pub radius: i32,
    pub trail_length: usize,
}

impl Default for GCircleConfig {
    fn default() -> Self {
        Self {
            margin: 160,
            radius: 120,
            trail_length: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Full-scale range when auto scaling is off, and the seed when it is on
    pub g_max_default: f64,
    pub auto: bool,
    pub g_max_min: f64,
    pub g_max_max: f64,
    /// Blend rate toward the auto-scale target, per frame
    pub rate: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            g_max_default: 1.5,
            auto: true,
            g_max_min: 1.2,
            g_max_max: 2.5,
            rate: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Manual skew correction between camera and recorder clocks (seconds)
    pub time_offset: f64,
    /// Telemetry-clock timestamp of video frame 0. When unset the video is
    /// assumed to end at the last telemetry timestamp.
    pub video_start: Option<f64>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            time_offset: -4.0,
            video_start: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub csv_path: PathBuf,
    pub video_path: PathBuf,
    pub output_video: PathBuf,
    pub channels: ChannelMap,
    pub circle: GCircleConfig,
    pub scale: ScaleConfig,
    pub alignment: AlignmentConfig,
    /// Exponential smoothing factor for the acceleration channels, (0, 1]
    pub smooth_alpha: f64,
    /// Draw the numeric readout in the top-left corner
    pub hud: bool,
    /// Optional JSON progress file refreshed during the pass
    pub status_file: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data.csv"),
            video_path: PathBuf::from("vid.mp4"),
            output_video: PathBuf::from("telemetry_video_g.mp4"),
            channels: ChannelMap::default(),
            circle: GCircleConfig::default(),
            scale: ScaleConfig::default(),
            alignment: AlignmentConfig::default(),
            smooth_alpha: 0.12,
            hud: true,
            status_file: None,
        }
    }
}

impl OverlayConfig {
    /// Load a JSON config; missing fields fall back to defaults.
    pub fn load(path: &Path) -> OverlayResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: OverlayConfig = serde_json::from_str(&contents)
            .map_err(|e| OverlayError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if !(self.smooth_alpha > 0.0 && self.smooth_alpha <= 1.0) {
            return Err(OverlayError::Config(format!(
                "smooth_alpha must be in (0, 1], got {}",
                self.smooth_alpha
            )));
        }
        let s = &self.scale;
        if !(s.rate > 0.0 && s.rate <= 1.0) {
            return Err(OverlayError::Config(format!(
                "scale.rate must be in (0, 1], got {}",
                s.rate
            )));
        }
        if s.g_max_default <= 0.0 || s.g_max_min <= 0.0 || s.g_max_max <= 0.0 {
            return Err(OverlayError::Config("g_max bounds must be positive".to_string()));
        }
        if s.g_max_min > s.g_max_max {
            return Err(OverlayError::Config(format!(
                "scale.g_max_min ({}) exceeds scale.g_max_max ({})",
                s.g_max_min, s.g_max_max
            )));
        }
        if self.circle.trail_length == 0 {
            return Err(OverlayError::Config("circle.trail_length must be at least 1".to_string()));
        }
        if self.circle.radius <= 0 {
            return Err(OverlayError::Config(format!(
                "circle.radius must be positive, got {}",
                self.circle.radius
            )));
        }
        if !self.alignment.time_offset.is_finite() {
            return Err(OverlayError::Config("alignment.time_offset must be finite".to_string()));
        }
        Ok(())
    }
}
