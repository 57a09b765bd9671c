use log::{info, warn};
use serde::Serialize;

use crate::alignment::SampleResolver;
use crate::canvas::Canvas;
use crate::error::{OverlayError, OverlayResult};
use crate::progress::RenderProgress;
use crate::session::RenderSession;

/// Fixed geometry and timing of a video stream, known before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VideoGeometry {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    /// Advertised frame count; the stream may end earlier
    pub frame_count: u64,
}

impl VideoGeometry {
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.fps
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(OverlayError::Video(format!("invalid frame rate {}", self.fps)));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(OverlayError::Video(format!(
                "invalid frame size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Frame-sequential video input.
pub trait FrameSource {
    type Frame: Canvas;

    fn geometry(&self) -> VideoGeometry;

    /// `Ok(None)` at end of stream. An `Err` means the frame could not be
    /// decoded; the pass stops there rather than skipping, which would shift
    /// every later frame against the telemetry.
    fn next_frame(&mut self) -> OverlayResult<Option<Self::Frame>>;
}

/// Frame-sequential video output.
pub trait FrameSink<F> {
    fn write_frame(&mut self, frame: &F) -> OverlayResult<()>;

    fn finish(&mut self) -> OverlayResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassSummary {
    pub frames_rendered: u64,
    pub final_g_max: f64,
    pub peak_g_max: f64,
    pub elapsed_secs: f64,
    /// The source reported a decode error before its natural end
    pub ended_early: bool,
}

/// Render every frame of `source` into `sink`, in order.
pub fn render_pass<S, W, R>(
    source: &mut S,
    sink: &mut W,
    session: &mut RenderSession<R>,
    progress: &mut RenderProgress,
) -> OverlayResult<PassSummary>
where
    S: FrameSource,
    W: FrameSink<S::Frame>,
    R: SampleResolver,
{
    let mut frame_index = 0u64;
    let mut peak_g_max = session.g_max();
    let mut last_t = session.series().start_time();
    let mut ended_early = false;

    loop {
        let mut frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopping at frame {}: unreadable input frame ({})", frame_index, e);
                ended_early = true;
                break;
            }
        };

        let overlay = session.advance(frame_index, &mut frame)?;
        sink.write_frame(&frame)?;

        frame_index += 1;
        peak_g_max = peak_g_max.max(overlay.g_max);
        last_t = overlay.telemetry_t;
        progress.record(frame_index, last_t, overlay.g_max);
    }

    sink.finish()?;
    let status = progress.finish(frame_index, last_t, session.g_max());
    info!("Peak g range: {:.2} g", peak_g_max);

    Ok(PassSummary {
        frames_rendered: frame_index,
        final_g_max: session.g_max(),
        peak_g_max,
        elapsed_secs: status.elapsed_secs,
        ended_early,
    })
}
