/// First-order exponential low-pass over the lateral and longitudinal channels
///
/// `smooth = alpha * raw + (1 - alpha) * smooth_prev`, applied per channel.
/// Larger alpha tracks faster but lets more jitter through.
#[derive(Clone, Debug)]
pub struct SignalSmoother {
    alpha: f64,
    smooth_lat: f64,
    smooth_long: f64,
    first_sample_seen: bool,
}

impl SignalSmoother {
    /// `alpha` must lie in (0, 1]; see `OverlayConfig::validate`.
    pub fn new(alpha: f64) -> Self {
        SignalSmoother {
            alpha,
            smooth_lat: 0.0,
            smooth_long: 0.0,
            first_sample_seen: false,
        }
    }

    /// Feed one raw sample, returns (smooth_lat, smooth_long).
    /// The first sample seeds the state directly so there is no lag-in ramp.
    pub fn update(&mut self, raw_lat: f64, raw_long: f64) -> (f64, f64) {
        if !self.first_sample_seen {
            self.smooth_lat = raw_lat;
            self.smooth_long = raw_long;
            self.first_sample_seen = true;
        } else {
            let a = self.alpha;
            self.smooth_lat = a * raw_lat + (1.0 - a) * self.smooth_lat;
            self.smooth_long = a * raw_long + (1.0 - a) * self.smooth_long;
        }
        (self.smooth_lat, self.smooth_long)
    }

    pub fn current(&self) -> Option<(f64, f64)> {
        self.first_sample_seen
            .then_some((self.smooth_lat, self.smooth_long))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
