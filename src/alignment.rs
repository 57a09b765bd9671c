//! Frame-to-telemetry time alignment
//!
//! The camera and the telemetry recorder run on unrelated clocks. A frame
//! index is mapped onto the telemetry clock as
//!
//!   telemetry_t = clamp(video_start + frame_index / fps + time_offset)
//!
//! and then resolved to a sample index: the last sample whose timestamp does
//! not exceed `telemetry_t`.

use log::info;
use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetrySeries;

/// How `video_start` (telemetry-clock time of frame 0) is obtained.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Calibration {
    /// Assume the last video frame lines up with the last telemetry sample.
    /// This is a heuristic, not a measured sync point, and is the largest
    /// source of alignment error; `time_offset` exists to correct it.
    EndAligned,
    /// Frame 0 is at this telemetry timestamp (seconds).
    StartAt(f64),
}

impl Calibration {
    pub fn from_video_start(video_start: Option<f64>) -> Self {
        match video_start {
            Some(t) => Calibration::StartAt(t),
            None => Calibration::EndAligned,
        }
    }

    pub fn video_start(&self, series: &TelemetrySeries, video_duration: f64) -> f64 {
        match *self {
            Calibration::EndAligned => series.end_time() - video_duration,
            Calibration::StartAt(t) => t,
        }
    }
}

/// Maps video-local frame indices onto the telemetry clock.
#[derive(Clone, Debug)]
pub struct FrameTimeMapper {
    fps: f64,
    video_start: f64,
    time_offset: f64,
}

impl FrameTimeMapper {
    pub fn new(fps: f64, video_start: f64, time_offset: f64) -> Self {
        Self {
            fps,
            video_start,
            time_offset,
        }
    }

    /// Derive `video_start` from a calibration anchor and log the result.
    pub fn calibrated(
        series: &TelemetrySeries,
        calibration: Calibration,
        fps: f64,
        frame_count: u64,
        time_offset: f64,
    ) -> Self {
        let video_duration = frame_count as f64 / fps;
        let video_start = calibration.video_start(series, video_duration);
        info!("Video duration: {:.3}s", video_duration);
        info!("Calibration: {:?}", calibration);
        info!("Video start: {:.3}", video_start);
        info!("Video end:   {:.3}", video_start + video_duration);
        info!("Vid time offset: {:+.3}s", time_offset);
        Self::new(fps, video_start, time_offset)
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn video_start(&self) -> f64 {
        self.video_start
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    /// Telemetry timestamp for a frame, clipped to the recorded span.
    pub fn telemetry_time(&self, series: &TelemetrySeries, frame_index: u64) -> f64 {
        let video_t = frame_index as f64 / self.fps;
        series.clamp_time(self.video_start + video_t + self.time_offset)
    }
}

/// Strategy for turning a telemetry timestamp into a sample index.
pub trait SampleResolver {
    /// Largest index whose timestamp is `<= t`, or 0 when `t` precedes the log.
    fn resolve(&mut self, series: &TelemetrySeries, t: f64) -> usize;

    /// True when successive queries must never go back in time.
    fn requires_monotonic(&self) -> bool;
}

/// Forward-only cursor. Amortized O(1) per frame, O(n) across a pass.
///
/// Only valid while query times are non-decreasing; it never moves back.
#[derive(Clone, Debug, Default)]
pub struct RollingCursor {
    idx: usize,
}

impl RollingCursor {
    pub fn new() -> Self {
        Self { idx: 0 }
    }

    pub fn index(&self) -> usize {
        self.idx
    }
}

impl SampleResolver for RollingCursor {
    fn resolve(&mut self, series: &TelemetrySeries, t: f64) -> usize {
        let time = series.times();
        while self.idx + 1 < time.len() && time[self.idx + 1] <= t {
            self.idx += 1;
        }
        self.idx
    }

    fn requires_monotonic(&self) -> bool {
        true
    }
}

/// Stateless logarithmic lookup for seeking or re-rendering subranges.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinarySearchResolver;

impl SampleResolver for BinarySearchResolver {
    fn resolve(&mut self, series: &TelemetrySeries, t: f64) -> usize {
        series.times().partition_point(|&x| x <= t).saturating_sub(1)
    }

    fn requires_monotonic(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(time: Vec<f64>) -> TelemetrySeries {
        let n = time.len();
        TelemetrySeries::new(time, vec![0.0; n], vec![0.0; n]).unwrap()
    }

    #[test]
    fn test_end_aligned_start() {
        let s = series(vec![100.0, 150.0, 200.0]);
        // 300 frames at 30 fps = 10 s, ending at 200
        let mapper = FrameTimeMapper::calibrated(&s, Calibration::EndAligned, 30.0, 300, 0.0);
        assert_abs_diff_eq!(mapper.video_start(), 190.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mapper.telemetry_time(&s, 0), 190.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mapper.telemetry_time(&s, 150), 195.0, epsilon = 1e-9);
    }

    #[test]
    fn test_explicit_start_and_offset() {
        let s = series(vec![0.0, 50.0]);
        let mapper =
            FrameTimeMapper::calibrated(&s, Calibration::from_video_start(Some(10.0)), 25.0, 100, -4.0);
        assert_abs_diff_eq!(mapper.video_start(), 10.0);
        // 10 + 50/25 - 4
        assert_abs_diff_eq!(mapper.telemetry_time(&s, 50), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_telemetry_time_is_clamped() {
        let s = series(vec![5.0, 6.0, 7.0]);
        let mapper = FrameTimeMapper::new(1.0, 0.0, 0.0);
        assert_eq!(mapper.telemetry_time(&s, 0), 5.0);
        assert_eq!(mapper.telemetry_time(&s, 6), 6.0);
        assert_eq!(mapper.telemetry_time(&s, 1000), 7.0);
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let s = series((0..100).map(|i| i as f64 * 0.1).collect());
        let mut cursor = RollingCursor::new();
        let mut last = 0;
        let mut t = -1.0;
        while t < 12.0 {
            let idx = cursor.resolve(&s, t);
            assert!(idx >= last);
            assert!(s.time_at(idx) <= t.max(s.start_time()));
            last = idx;
            t += 0.037;
        }
        assert_eq!(last, 99);
    }

    #[test]
    fn test_cursor_never_moves_back() {
        let s = series(vec![0.0, 1.0, 2.0, 3.0]);
        let mut cursor = RollingCursor::new();
        assert_eq!(cursor.resolve(&s, 2.5), 2);
        assert_eq!(cursor.resolve(&s, 0.5), 2);
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_ties_resolve_to_last_match() {
        let s = series(vec![0.0, 1.0, 1.0, 1.0, 2.0]);
        let mut cursor = RollingCursor::new();
        assert_eq!(cursor.resolve(&s, 0.99), 0);
        assert_eq!(cursor.resolve(&s, 1.0), 3);
        assert_eq!(BinarySearchResolver.resolve(&s, 1.0), 3);
        assert_eq!(BinarySearchResolver.resolve(&s, 1.5), 3);
    }

    #[test]
    fn test_resolvers_agree_on_forward_queries() {
        let s = series(vec![0.0, 0.02, 0.02, 0.07, 0.1, 0.25, 0.25, 0.3, 0.9]);
        let mut cursor = RollingCursor::new();
        let mut search = BinarySearchResolver;
        for i in 0..=100 {
            let t = i as f64 * 0.01;
            assert_eq!(cursor.resolve(&s, t), search.resolve(&s, t), "t = {}", t);
        }
    }

    #[test]
    fn test_binary_search_seeks_backwards() {
        let s = series(vec![0.0, 1.0, 2.0, 3.0]);
        let mut search = BinarySearchResolver;
        assert_eq!(search.resolve(&s, 2.5), 2);
        assert_eq!(search.resolve(&s, 0.5), 0);
        assert_eq!(search.resolve(&s, -1.0), 0);
        assert!(!search.requires_monotonic());
    }
}
