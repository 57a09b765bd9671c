//! G-force overlay for driving video
//!
//! Aligns an independently clocked acceleration log against a video, smooths
//! and auto-scales the lateral/longitudinal signal, and draws a g-circle with
//! a fading trail onto every frame.

pub mod alignment;
pub mod autoscale;
pub mod canvas;
pub mod config;
pub mod error;
pub mod g_circle;
pub mod hud;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod smoothing;
pub mod telemetry;

#[cfg(feature = "video")]
pub mod video;

pub use alignment::{BinarySearchResolver, Calibration, FrameTimeMapper, RollingCursor, SampleResolver};
pub use autoscale::AutoScaleController;
pub use canvas::{Bgr, Canvas, Px, RecordingCanvas, Stroke};
pub use config::{ChannelMap, OverlayConfig};
pub use error::{DataError, OverlayError, OverlayResult};
pub use g_circle::{GCircleRenderer, GTier, TrailBuffer};
pub use pipeline::{render_pass, FrameSink, FrameSource, PassSummary, VideoGeometry};
pub use progress::{RenderProgress, RenderStatus};
pub use session::{FrameOverlay, RenderSession};
pub use smoothing::SignalSmoother;
pub use telemetry::TelemetrySeries;
