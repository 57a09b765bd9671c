use flate2::read::GzDecoder;
use log::{info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::ChannelMap;
use crate::error::{DataError, OverlayResult};

/// m/s² per g. Applied once, at load time.
pub const GRAVITY: f64 = 9.8;

/// Cleaned acceleration log, in seconds and g.
///
/// All three columns have the same non-zero length, contain no NaN, and
/// `time` never decreases. Nothing mutates a series after construction.
#[derive(Clone, Debug)]
pub struct TelemetrySeries {
    time: Vec<f64>,
    long_g: Vec<f32>,
    lat_g: Vec<f32>,
}

impl TelemetrySeries {
    /// Build from columns already in seconds and g.
    pub fn new(time: Vec<f64>, long_g: Vec<f32>, lat_g: Vec<f32>) -> Result<Self, DataError> {
        if time.len() != long_g.len() || time.len() != lat_g.len() {
            return Err(DataError::LengthMismatch {
                time: time.len(),
                long: long_g.len(),
                lat: lat_g.len(),
            });
        }
        if time.is_empty() {
            return Err(DataError::NoValidSamples);
        }
        for (row, t) in time.iter().enumerate() {
            if !t.is_finite() {
                return Err(DataError::InvalidTimestamp { row, value: t.to_string() });
            }
        }
        if long_g.iter().chain(lat_g.iter()).any(|v| v.is_nan()) {
            return Err(DataError::NoValidSamples);
        }
        if let Some(row) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(DataError::NonMonotonicTime {
                row: row + 1,
                prev: time[row],
                current: time[row + 1],
            });
        }
        Ok(Self { time, long_g, lat_g })
    }

    /// Load a CSV log, transparently decompressing `*.gz`.
    pub fn load(path: &Path, channels: &ChannelMap) -> OverlayResult<Self> {
        let file = File::open(path)?;
        let series = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            Self::from_reader(BufReader::new(GzDecoder::new(file)), channels)?
        } else {
            Self::from_reader(BufReader::new(file), channels)?
        };
        info!(
            "Telemetry {}: {} samples, {:.3}s .. {:.3}s",
            path.display(),
            series.len(),
            series.start_time(),
            series.end_time()
        );
        Ok(series)
    }

    /// Parse CSV with a header row. Timestamps are milliseconds, acceleration
    /// m/s². Rows with a missing or non-numeric acceleration value are dropped.
    pub fn from_reader<R: Read>(reader: R, channels: &ChannelMap) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };
        let time_col = column(&channels.time)?;
        let long_col = column(&channels.long)?;
        let lat_col = column(&channels.lat)?;

        let mut time = Vec::new();
        let mut long_g = Vec::new();
        let mut lat_g = Vec::new();
        let mut dropped = 0usize;

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // Line 1 is the header
            let row = i + 2;

            let long = parse_channel(record.get(long_col));
            let lat = parse_channel(record.get(lat_col));
            let (Some(long), Some(lat)) = (long, lat) else {
                dropped += 1;
                continue;
            };

            let raw_t = record.get(time_col).unwrap_or("");
            let t_ms = match raw_t.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    return Err(DataError::InvalidTimestamp {
                        row,
                        value: raw_t.to_string(),
                    })
                }
            };
            let t = t_ms / 1000.0;

            if let Some(&prev) = time.last() {
                if t < prev {
                    return Err(DataError::NonMonotonicTime { row, prev, current: t });
                }
            }

            time.push(t);
            long_g.push((long / GRAVITY) as f32);
            lat_g.push((lat / GRAVITY) as f32);
        }

        if dropped > 0 {
            warn!("Dropped {} telemetry rows with missing acceleration", dropped);
        }

        Self::new(time, long_g, lat_g)
    }

    /// Clip `t` to the recorded span. Never extrapolates.
    pub fn clamp_time(&self, t: f64) -> f64 {
        t.clamp(self.start_time(), self.end_time())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.time[0]
    }

    pub fn end_time(&self) -> f64 {
        self.time[self.time.len() - 1]
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    pub fn time_at(&self, idx: usize) -> f64 {
        self.time[idx]
    }

    pub fn times(&self) -> &[f64] {
        &self.time
    }

    /// (lateral, longitudinal) in g
    pub fn sample(&self, idx: usize) -> (f32, f32) {
        (self.lat_g[idx], self.long_g[idx])
    }
}

fn parse_channel(field: Option<&str>) -> Option<f64> {
    field
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn parse(csv: &str) -> Result<TelemetrySeries, DataError> {
        TelemetrySeries::from_reader(csv.as_bytes(), &ChannelMap::default())
    }

    #[test]
    fn test_converts_units_once() {
        let series = parse("Time,imu.long,imu.lat\n1000,9.8,-4.9\n2000,0,19.6\n").unwrap();
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series.time_at(0), 1.0);
        assert_abs_diff_eq!(series.time_at(1), 2.0);
        let (lat, long) = series.sample(0);
        assert_abs_diff_eq!(long, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lat, -0.5, epsilon = 1e-6);
        let (lat, _) = series.sample(1);
        assert_abs_diff_eq!(lat, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_drops_rows_with_nan() {
        let csv = "Time,imu.long,imu.lat,speed\n0,1,1,5\n100,,1,5\n200,NaN,2,5\n300,2,nan,5\n400,3,3,5\n";
        let series = parse(csv).unwrap();
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series.time_at(1), 0.4);
    }

    #[test]
    fn test_missing_column() {
        let err = parse("Time,imu.long\n0,1\n").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "imu.lat"));
    }

    #[test]
    fn test_all_rows_invalid() {
        let err = parse("Time,imu.long,imu.lat\n0,,\n1,nan,nan\n").unwrap_err();
        assert!(matches!(err, DataError::NoValidSamples));
        let err = parse("Time,imu.long,imu.lat\n").unwrap_err();
        assert!(matches!(err, DataError::NoValidSamples));
    }

    #[test]
    fn test_rejects_backwards_time() {
        let err = parse("Time,imu.long,imu.lat\n0,1,1\n500,1,1\n400,1,1\n").unwrap_err();
        assert!(matches!(err, DataError::NonMonotonicTime { row: 4, .. }));
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let err = parse("Time,imu.long,imu.lat\nabc,1,1\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidTimestamp { row: 2, .. }));
    }

    #[test]
    fn test_custom_channel_names() {
        let channels = ChannelMap {
            time: "t_ms".to_string(),
            long: "ax".to_string(),
            lat: "ay".to_string(),
        };
        let series =
            TelemetrySeries::from_reader("ay,t_ms,ax\n9.8,0,0\n".as_bytes(), &channels).unwrap();
        let (lat, long) = series.sample(0);
        assert_abs_diff_eq!(lat, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(long, 0.0);
    }

    #[test]
    fn test_clamp_time() {
        let series = TelemetrySeries::new(vec![1.0, 2.0, 5.0], vec![0.0; 3], vec![0.0; 3]).unwrap();
        assert_eq!(series.clamp_time(-10.0), 1.0);
        assert_eq!(series.clamp_time(0.999), 1.0);
        assert_eq!(series.clamp_time(3.3), 3.3);
        assert_eq!(series.clamp_time(5.0001), 5.0);
        assert_eq!(series.clamp_time(1e9), 5.0);
        assert_abs_diff_eq!(series.duration(), 4.0);
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            TelemetrySeries::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 0.0]),
            Err(DataError::LengthMismatch { .. })
        ));
        assert!(matches!(
            TelemetrySeries::new(vec![], vec![], vec![]),
            Err(DataError::NoValidSamples)
        ));
        assert!(TelemetrySeries::new(vec![0.0, 1.0, 1.0], vec![0.0; 3], vec![0.0; 3]).is_ok());
    }

    #[test]
    fn test_load_gz() {
        let path = std::env::temp_dir().join(format!("gforce_overlay_test_{}.csv.gz", std::process::id()));
        {
            let file = File::create(&path).unwrap();
            let mut gz = GzEncoder::new(file, Compression::default());
            gz.write_all(b"Time,imu.long,imu.lat\n0,0,0\n1000,4.9,0\n").unwrap();
            gz.finish().unwrap();
        }
        let series = TelemetrySeries::load(&path, &ChannelMap::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series.sample(1).1, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_load_missing_file() {
        let result = TelemetrySeries::load(Path::new("/nonexistent/data.csv"), &ChannelMap::default());
        assert!(matches!(result, Err(crate::error::OverlayError::Io(_))));
    }
}
