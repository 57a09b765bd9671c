use thiserror::Error;

/// Problems with the telemetry log itself. Always fatal, raised before any
/// frame is processed.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("No valid samples after dropping rows with NaN acceleration")]
    NoValidSamples,

    #[error("Invalid timestamp on row {row}: {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("Timestamps go backwards on row {row}: {prev} -> {current}")]
    NonMonotonicTime { row: usize, prev: f64, current: f64 },

    #[error("Channel lengths differ: time={time}, long={long}, lat={lat}")]
    LengthMismatch { time: usize, long: usize, lat: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Overlay error types
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Telemetry error: {0}")]
    Data(#[from] DataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Frame {requested} requested after frame {previous}; rolling alignment only moves forward")]
    FrameOrder { previous: u64, requested: u64 },

    #[error("Video error: {0}")]
    Video(String),

    #[error("Draw failed: {0}")]
    Draw(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

#[cfg(feature = "video")]
impl From<opencv::Error> for OverlayError {
    fn from(e: opencv::Error) -> Self {
        OverlayError::Video(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_wraps_into_overlay_error() {
        let err: OverlayError = DataError::MissingColumn("imu.lat".to_string()).into();
        assert!(matches!(err, OverlayError::Data(DataError::MissingColumn(_))));
        assert_eq!(err.to_string(), "Telemetry error: Missing required column: imu.lat");
    }

    #[test]
    fn test_frame_order_message() {
        let err = OverlayError::FrameOrder { previous: 10, requested: 3 };
        assert!(err.to_string().contains("Frame 3 requested after frame 10"));
    }
}
