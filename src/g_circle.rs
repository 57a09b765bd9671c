use serde::Serialize;
use std::collections::VecDeque;

use crate::canvas::{Bgr, Canvas, Px, Stroke};
use crate::error::OverlayResult;

/// Reference rings drawn when they fit inside the current range (g)
const REFERENCE_RINGS: [f64; 2] = [0.5, 1.0];
const TRAIL_MIN_RADIUS: f64 = 3.0;
const TRAIL_RADIUS_SPAN: f64 = 6.0;
const MARKER_RING_RADIUS: i32 = 14;
const MARKER_DOT_RADIUS: i32 = 6;

/// Severity band of the combined load. Thresholds are absolute g, not
/// relative to the display range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GTier {
    Safe,
    Caution,
    Critical,
}

impl GTier {
    pub fn classify(g_mag: f64) -> Self {
        if g_mag < 0.6 {
            GTier::Safe
        } else if g_mag < 1.0 {
            GTier::Caution
        } else {
            GTier::Critical
        }
    }

    pub fn color(&self) -> Bgr {
        match self {
            GTier::Safe => Bgr(0, 180, 0),
            GTier::Caution => Bgr(0, 200, 220),
            GTier::Critical => Bgr(0, 0, 220),
        }
    }
}

/// Where a (lat, long) reading lands on the circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub x: f64,
    pub y: f64,
    /// Magnitude of the clamped reading, at most `g_max * sqrt(2)`
    pub g_mag: f64,
    pub tier: GTier,
}

/// Fixed-capacity FIFO of past marker positions, oldest first.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
    points: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        TrailBuffer {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, point: (f64, f64)) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.points.iter()
    }
}

/// Draws the friction-circle style G indicator.
///
/// Lateral maps to the horizontal axis, longitudinal to the vertical axis
/// with forward acceleration pointing up.
#[derive(Clone, Debug)]
pub struct GCircleRenderer {
    center: Px,
    radius: i32,
    trail: TrailBuffer,
}

impl GCircleRenderer {
    pub fn new(center: Px, radius: i32, trail_length: usize) -> Self {
        Self {
            center,
            radius,
            trail: TrailBuffer::new(trail_length),
        }
    }

    /// Place the circle `margin` pixels in from the bottom-right corner.
    pub fn for_frame(width: i32, height: i32, margin: i32, radius: i32, trail_length: usize) -> Self {
        Self::new(Px::new(width - margin, height - margin), radius, trail_length)
    }

    pub fn center(&self) -> Px {
        self.center
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    /// Clamp to `[-g_max, g_max]` per axis and project to pixels.
    /// Smoothing lag can push the reading past the range for a few frames.
    pub fn project(&self, lat_g: f64, long_g: f64, g_max: f64) -> Projection {
        let lat = lat_g.clamp(-g_max, g_max);
        let lon = long_g.clamp(-g_max, g_max);
        let r = self.radius as f64;

        let x = self.center.x as f64 + (lat / g_max) * r;
        let y = self.center.y as f64 - (lon / g_max) * r;
        let g_mag = (lat * lat + lon * lon).sqrt();

        Projection {
            x,
            y,
            g_mag,
            tier: GTier::classify(g_mag),
        }
    }

    pub fn draw<C: Canvas>(&mut self, canvas: &mut C, lat_g: f64, long_g: f64, g_max: f64) -> OverlayResult<()> {
        let Px { x: cx, y: cy } = self.center;
        let radius = self.radius;

        canvas.circle(self.center, radius, Bgr::LIGHT_GRAY, Stroke::Outline(2))?;
        canvas.line(Px::new(cx - radius, cy), Px::new(cx + radius, cy), Bgr::GRAY, 1)?;
        canvas.line(Px::new(cx, cy - radius), Px::new(cx, cy + radius), Bgr::GRAY, 1)?;

        for g in REFERENCE_RINGS {
            if g < g_max {
                let r = (radius as f64 * g / g_max) as i32;
                canvas.circle(self.center, r, Bgr::DARK_GRAY, Stroke::Outline(1))?;
            }
        }

        let p = self.project(lat_g, long_g, g_max);
        let color = p.tier.color();

        self.trail.push((p.x, p.y));
        let n = self.trail.len() as f64;
        for (i, &(tx, ty)) in self.trail.iter().enumerate() {
            let a = i as f64 / n;
            let size = (TRAIL_MIN_RADIUS + TRAIL_RADIUS_SPAN * a) as i32;
            canvas.circle(Px::from_f64(tx, ty), size, color, Stroke::Filled)?;
        }

        let marker = Px::from_f64(p.x, p.y);
        canvas.circle(marker, MARKER_RING_RADIUS, color, Stroke::Outline(2))?;
        canvas.circle(marker, MARKER_DOT_RADIUS, Bgr::WHITE, Stroke::Filled)?;

        canvas.text(
            &format!("{:.2} g", g_max),
            Px::new(cx - 18, cy - radius - 10),
            0.4,
            Bgr::LIGHT_GRAY,
            1,
        )?;

        Ok(())
    }
}
