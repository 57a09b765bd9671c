//! OpenCV video backend
//!
//! Frames stay in OpenCV's native BGR `Mat` layout end to end; the overlay is
//! drawn straight into the decoded frame.

use log::info;
use opencv::{
    core::{Mat, Point, Scalar, Size},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::io;
use std::path::Path;

use crate::canvas::{Bgr, Canvas, Px, Stroke};
use crate::error::{OverlayError, OverlayResult};
use crate::pipeline::{FrameSink, FrameSource, VideoGeometry};

fn scalar(c: Bgr) -> Scalar {
    Scalar::new(c.0 as f64, c.1 as f64, c.2 as f64, 0.0)
}

fn point(p: Px) -> Point {
    Point::new(p.x, p.y)
}

fn path_str(path: &Path) -> OverlayResult<&str> {
    path.to_str()
        .ok_or_else(|| OverlayError::Video(format!("non UTF-8 path: {}", path.display())))
}

fn draw_err(e: opencv::Error) -> OverlayError {
    OverlayError::Draw(e.to_string())
}

impl Canvas for Mat {
    fn circle(&mut self, center: Px, radius: i32, color: Bgr, stroke: Stroke) -> OverlayResult<()> {
        let thickness = match stroke {
            Stroke::Outline(t) => t,
            Stroke::Filled => imgproc::FILLED,
        };
        imgproc::circle(self, point(center), radius, scalar(color), thickness, imgproc::LINE_8, 0)
            .map_err(draw_err)
    }

    fn line(&mut self, from: Px, to: Px, color: Bgr, thickness: i32) -> OverlayResult<()> {
        imgproc::line(self, point(from), point(to), scalar(color), thickness, imgproc::LINE_8, 0)
            .map_err(draw_err)
    }

    fn text(&mut self, text: &str, origin: Px, scale: f64, color: Bgr, thickness: i32) -> OverlayResult<()> {
        imgproc::put_text(
            self,
            text,
            point(origin),
            imgproc::FONT_HERSHEY_SIMPLEX,
            scale,
            scalar(color),
            thickness,
            imgproc::LINE_8,
            false,
        )
        .map_err(draw_err)
    }
}

pub struct VideoReader {
    cap: VideoCapture,
    geometry: VideoGeometry,
}

impl VideoReader {
    pub fn open(path: &Path) -> OverlayResult<Self> {
        info!("Opening video: {}", path.display());

        let cap = VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(OverlayError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Cannot open video {}", path.display()),
            )));
        }

        let fps = cap.get(videoio::CAP_PROP_FPS)?;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let frame_count = cap.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;

        let geometry = VideoGeometry {
            width,
            height,
            fps,
            frame_count,
        };
        geometry.validate()?;

        info!(
            "Video properties: {}x{} @ {:.3} FPS, {} frames",
            width, height, fps, frame_count
        );

        Ok(Self { cap, geometry })
    }
}

impl FrameSource for VideoReader {
    type Frame = Mat;

    fn geometry(&self) -> VideoGeometry {
        self.geometry
    }

    fn next_frame(&mut self) -> OverlayResult<Option<Mat>> {
        let mut mat = Mat::default();
        if !self.cap.read(&mut mat)? || mat.empty() {
            return Ok(None);
        }
        Ok(Some(mat))
    }
}

pub struct VideoSink {
    writer: VideoWriter,
}

impl VideoSink {
    /// `mp4v` output with the same size and rate as the input.
    pub fn create(path: &Path, geometry: &VideoGeometry) -> OverlayResult<Self> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            path_str(path)?,
            fourcc,
            geometry.fps,
            Size::new(geometry.width, geometry.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(OverlayError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("Cannot create output video {}", path.display()),
            )));
        }
        info!("Output video: {}", path.display());
        Ok(Self { writer })
    }
}

impl FrameSink<Mat> for VideoSink {
    fn write_frame(&mut self, frame: &Mat) -> OverlayResult<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn finish(&mut self) -> OverlayResult<()> {
        self.writer.release()?;
        Ok(())
    }
}
