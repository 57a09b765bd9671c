use crate::canvas::{Bgr, Canvas, Px};
use crate::error::OverlayResult;

const HUD_X: i32 = 40;

/// Numeric readout in the top-left corner: the resolved sample's timestamp
/// in unix milliseconds and the smoothed channels.
pub fn draw_hud<C: Canvas>(canvas: &mut C, sample_time: f64, smooth_long: f64, smooth_lat: f64) -> OverlayResult<()> {
    let unix_ms = (sample_time * 1000.0) as i64;
    canvas.text(&format!("Unix: {}", unix_ms), Px::new(HUD_X, 50), 0.7, Bgr::WHITE, 2)?;
    canvas.text(&format!("Long G: {:+.3}", smooth_long), Px::new(HUD_X, 100), 0.9, Bgr::WHITE, 2)?;
    canvas.text(&format!("Lat G:  {:+.3}", smooth_lat), Px::new(HUD_X, 150), 0.9, Bgr::WHITE, 2)?;
    Ok(())
}
