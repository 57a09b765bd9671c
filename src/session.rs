//! Per-pass render state
//!
//! A `RenderSession` owns everything that changes from frame to frame: the
//! alignment cursor, the smoothed signal, the display range and the trail.
//! One session renders one video/telemetry pair, front to back, then is
//! dropped.

use log::debug;
use serde::Serialize;

use crate::alignment::{Calibration, FrameTimeMapper, RollingCursor, SampleResolver};
use crate::autoscale::AutoScaleController;
use crate::canvas::Canvas;
use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::g_circle::{GCircleRenderer, GTier};
use crate::hud::draw_hud;
use crate::pipeline::VideoGeometry;
use crate::smoothing::SignalSmoother;
use crate::telemetry::TelemetrySeries;

/// What was resolved and drawn for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameOverlay {
    pub frame_index: u64,
    /// Query time on the telemetry clock, after clamping
    pub telemetry_t: f64,
    pub sample_index: usize,
    pub sample_time: f64,
    pub raw_lat: f64,
    pub raw_long: f64,
    pub smooth_lat: f64,
    pub smooth_long: f64,
    pub g_max: f64,
    pub tier: GTier,
}

pub struct RenderSession<R: SampleResolver = RollingCursor> {
    series: TelemetrySeries,
    mapper: FrameTimeMapper,
    resolver: R,
    smoother: SignalSmoother,
    scale: AutoScaleController,
    g_circle: GCircleRenderer,
    hud: bool,
    last_frame: Option<u64>,
}

impl RenderSession<RollingCursor> {
    /// Session for a sequential pass using the forward-only cursor.
    pub fn new(config: &OverlayConfig, series: TelemetrySeries, geometry: &VideoGeometry) -> OverlayResult<Self> {
        Self::with_resolver(config, series, geometry, RollingCursor::new())
    }
}

impl<R: SampleResolver> RenderSession<R> {
    pub fn with_resolver(
        config: &OverlayConfig,
        series: TelemetrySeries,
        geometry: &VideoGeometry,
        resolver: R,
    ) -> OverlayResult<Self> {
        config.validate()?;
        geometry.validate()?;

        let calibration = Calibration::from_video_start(config.alignment.video_start);
        let mapper = FrameTimeMapper::calibrated(
            &series,
            calibration,
            geometry.fps,
            geometry.frame_count,
            config.alignment.time_offset,
        );
        let g_circle = GCircleRenderer::for_frame(
            geometry.width,
            geometry.height,
            config.circle.margin,
            config.circle.radius,
            config.circle.trail_length,
        );

        Ok(Self {
            series,
            mapper,
            resolver,
            smoother: SignalSmoother::new(config.smooth_alpha),
            scale: AutoScaleController::new(&config.scale),
            g_circle,
            hud: config.hud,
            last_frame: None,
        })
    }

    pub fn series(&self) -> &TelemetrySeries {
        &self.series
    }

    pub fn mapper(&self) -> &FrameTimeMapper {
        &self.mapper
    }

    pub fn g_circle(&self) -> &GCircleRenderer {
        &self.g_circle
    }

    pub fn g_max(&self) -> f64 {
        self.scale.g_max()
    }

    /// Resolve, smooth and scale one frame without drawing anything.
    pub fn condition(&mut self, frame_index: u64) -> OverlayResult<FrameOverlay> {
        if let Some(previous) = self.last_frame {
            if self.resolver.requires_monotonic() && frame_index < previous {
                return Err(OverlayError::FrameOrder {
                    previous,
                    requested: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);

        let telemetry_t = self.mapper.telemetry_time(&self.series, frame_index);
        let idx = self.resolver.resolve(&self.series, telemetry_t);
        let (raw_lat, raw_long) = self.series.sample(idx);
        let (raw_lat, raw_long) = (raw_lat as f64, raw_long as f64);

        let (smooth_lat, smooth_long) = self.smoother.update(raw_lat, raw_long);
        let g_max = self.scale.update(smooth_lat, smooth_long);
        let tier = self.g_circle.project(smooth_lat, smooth_long, g_max).tier;

        debug!(
            "frame {} t={:.3} idx={} lat={:+.3} long={:+.3} g_max={:.3}",
            frame_index, telemetry_t, idx, smooth_lat, smooth_long, g_max
        );

        Ok(FrameOverlay {
            frame_index,
            telemetry_t,
            sample_index: idx,
            sample_time: self.series.time_at(idx),
            raw_lat,
            raw_long,
            smooth_lat,
            smooth_long,
            g_max,
            tier,
        })
    }

    /// Condition the frame and draw the HUD and g-circle onto `canvas`.
    pub fn advance<C: Canvas>(&mut self, frame_index: u64, canvas: &mut C) -> OverlayResult<FrameOverlay> {
        let overlay = self.condition(frame_index)?;
        if self.hud {
            draw_hud(canvas, overlay.sample_time, overlay.smooth_long, overlay.smooth_lat)?;
        }
        self.g_circle
            .draw(canvas, overlay.smooth_lat, overlay.smooth_long, overlay.g_max)?;
        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::BinarySearchResolver;
    use crate::canvas::RecordingCanvas;
    use approx::assert_abs_diff_eq;

    fn step_series() -> TelemetrySeries {
        TelemetrySeries::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 0.0, -1.0],
            vec![0.0, 0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    fn synced_config() -> OverlayConfig {
        let mut config = OverlayConfig::default();
        config.alignment.video_start = Some(0.0);
        config.alignment.time_offset = 0.0;
        config
    }

    fn geometry(fps: f64, frame_count: u64) -> VideoGeometry {
        VideoGeometry {
            width: 640,
            height: 480,
            fps,
            frame_count,
        }
    }

    #[test]
    fn test_frames_resolve_to_matching_samples() {
        let mut session = RenderSession::new(&synced_config(), step_series(), &geometry(1.0, 4)).unwrap();
        let expected_long = [0.0, 1.0, 0.0, -1.0];
        for i in 0..4u64 {
            let overlay = session.condition(i).unwrap();
            assert_eq!(overlay.sample_index, i as usize);
            assert_eq!(overlay.sample_time, i as f64);
            assert_eq!(overlay.raw_long, expected_long[i as usize]);
            assert_eq!(overlay.raw_lat, 0.0);
        }
    }

    #[test]
    fn test_first_frame_has_no_smoothing_lag() {
        let series = TelemetrySeries::new(vec![0.0, 1.0], vec![0.8, 0.8], vec![-0.4, -0.4]).unwrap();
        let mut session = RenderSession::new(&synced_config(), series, &geometry(1.0, 2)).unwrap();
        let overlay = session.condition(0).unwrap();
        assert_abs_diff_eq!(overlay.smooth_long, 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(overlay.smooth_lat, -0.4, epsilon = 1e-6);
        assert_eq!(overlay.tier, GTier::Caution);
    }

    #[test]
    fn test_smoothing_lags_step() {
        let mut session = RenderSession::new(&synced_config(), step_series(), &geometry(1.0, 4)).unwrap();
        session.condition(0).unwrap();
        let overlay = session.condition(1).unwrap();
        assert_abs_diff_eq!(overlay.smooth_long, 0.12, epsilon = 1e-9);
    }

    #[test]
    fn test_end_aligned_calibration_with_offset() {
        let mut config = OverlayConfig::default();
        config.alignment.time_offset = -1.0;
        // 2 frames at 1 fps end at t=3, start at 1, shifted back to 0
        let mut session = RenderSession::new(&config, step_series(), &geometry(1.0, 2)).unwrap();
        assert_abs_diff_eq!(session.mapper().video_start(), 1.0);
        assert_eq!(session.condition(0).unwrap().sample_index, 0);
        assert_eq!(session.condition(1).unwrap().sample_index, 1);
    }

    #[test]
    fn test_rejects_out_of_order_frames() {
        let mut session = RenderSession::new(&synced_config(), step_series(), &geometry(1.0, 4)).unwrap();
        session.condition(2).unwrap();
        session.condition(2).unwrap();
        let err = session.condition(1).unwrap_err();
        assert!(matches!(err, OverlayError::FrameOrder { previous: 2, requested: 1 }));
    }

    #[test]
    fn test_binary_search_session_can_seek() {
        let mut session = RenderSession::with_resolver(
            &synced_config(),
            step_series(),
            &geometry(1.0, 4),
            BinarySearchResolver,
        )
        .unwrap();
        assert_eq!(session.condition(3).unwrap().sample_index, 3);
        assert_eq!(session.condition(1).unwrap().sample_index, 1);
    }

    #[test]
    fn test_fixed_scale_when_auto_disabled() {
        let mut config = synced_config();
        config.scale.auto = false;
        let mut session = RenderSession::new(&config, step_series(), &geometry(1.0, 4)).unwrap();
        for i in 0..4 {
            assert_eq!(session.condition(i).unwrap().g_max, 1.5);
        }
    }

    #[test]
    fn test_advance_draws_hud_and_circle() {
        let mut session = RenderSession::new(&synced_config(), step_series(), &geometry(1.0, 4)).unwrap();
        let mut canvas = RecordingCanvas::new();
        let overlay = session.advance(0, &mut canvas).unwrap();
        let texts = canvas.texts();
        assert_eq!(texts[0], "Unix: 0");
        assert_eq!(texts[1], "Long G: +0.000");
        assert_eq!(texts[3], format!("{:.2} g", overlay.g_max));
        assert_eq!(session.g_circle().trail().len(), 1);
        assert_eq!(session.g_circle().center().x, 480);
    }

    #[test]
    fn test_advance_without_hud() {
        let mut config = synced_config();
        config.hud = false;
        let mut session = RenderSession::new(&config, step_series(), &geometry(1.0, 4)).unwrap();
        let mut canvas = RecordingCanvas::new();
        session.advance(0, &mut canvas).unwrap();
        assert_eq!(canvas.texts().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = synced_config();
        config.smooth_alpha = 2.0;
        assert!(RenderSession::new(&config, step_series(), &geometry(1.0, 4)).is_err());
        assert!(RenderSession::new(&synced_config(), step_series(), &geometry(0.0, 4)).is_err());
    }
}
