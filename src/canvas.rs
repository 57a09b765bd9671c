//! Drawing surface abstraction
//!
//! The overlay only needs circles, lines and text. Anything that can draw
//! those (an OpenCV `Mat`, a test recorder) can host it.

use serde::Serialize;

use crate::error::OverlayResult;

/// Colour in blue-green-red channel order, as video frames store it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Bgr(pub u8, pub u8, pub u8);

impl Bgr {
    pub const WHITE: Bgr = Bgr(255, 255, 255);
    pub const GRAY: Bgr = Bgr(120, 120, 120);
    pub const LIGHT_GRAY: Bgr = Bgr(180, 180, 180);
    pub const DARK_GRAY: Bgr = Bgr(80, 80, 80);
}

/// Pixel coordinate, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Px {
    pub x: i32,
    pub y: i32,
}

impl Px {
    pub fn new(x: i32, y: i32) -> Self {
        Px { x, y }
    }

    /// Truncates toward zero.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Px {
            x: x as i32,
            y: y as i32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stroke {
    Outline(i32),
    Filled,
}

pub trait Canvas {
    fn circle(&mut self, center: Px, radius: i32, color: Bgr, stroke: Stroke) -> OverlayResult<()>;

    fn line(&mut self, from: Px, to: Px, color: Bgr, thickness: i32) -> OverlayResult<()>;

    /// `origin` is the bottom-left of the text baseline.
    fn text(&mut self, text: &str, origin: Px, scale: f64, color: Bgr, thickness: i32) -> OverlayResult<()>;
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DrawOp {
    Circle { center: Px, radius: i32, color: Bgr, stroke: Stroke },
    Line { from: Px, to: Px, color: Bgr, thickness: i32 },
    Text { text: String, origin: Px, scale: f64, color: Bgr, thickness: i32 },
}

/// Canvas that keeps the primitives instead of rasterising them.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(Px, i32, Bgr, Stroke)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                DrawOp::Circle { center, radius, color, stroke } => Some((center, radius, color, stroke)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn circle(&mut self, center: Px, radius: i32, color: Bgr, stroke: Stroke) -> OverlayResult<()> {
        self.ops.push(DrawOp::Circle { center, radius, color, stroke });
        Ok(())
    }

    fn line(&mut self, from: Px, to: Px, color: Bgr, thickness: i32) -> OverlayResult<()> {
        self.ops.push(DrawOp::Line { from, to, color, thickness });
        Ok(())
    }

    fn text(&mut self, text: &str, origin: Px, scale: f64, color: Bgr, thickness: i32) -> OverlayResult<()> {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            scale,
            color,
            thickness,
        });
        Ok(())
    }
}
