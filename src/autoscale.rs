use crate::config::ScaleConfig;

/// Headroom applied to the current load when choosing a target range.
pub const HEADROOM: f64 = 1.2;

/// Adaptive full-scale range for the g-circle.
///
/// A second low-pass layered on the already smoothed signal, with its own much
/// slower rate so the scale does not breathe with every spike.
#[derive(Clone, Debug)]
pub struct AutoScaleController {
    enabled: bool,
    g_max_default: f64,
    g_max_min: f64,
    g_max_max: f64,
    rate: f64,
    current_g_max: f64,
}

impl AutoScaleController {
    pub fn new(config: &ScaleConfig) -> Self {
        Self {
            enabled: config.auto,
            g_max_default: config.g_max_default,
            g_max_min: config.g_max_min,
            g_max_max: config.g_max_max,
            rate: config.rate,
            current_g_max: config.g_max_default,
        }
    }

    pub fn update(&mut self, smooth_lat: f64, smooth_long: f64) -> f64 {
        if !self.enabled {
            self.current_g_max = self.g_max_default;
            return self.current_g_max;
        }

        let g_load = smooth_lat.abs().max(smooth_long.abs());
        let target = (g_load * HEADROOM).clamp(self.g_max_min, self.g_max_max);
        self.current_g_max = (1.0 - self.rate) * self.current_g_max + self.rate * target;
        self.current_g_max
    }

    pub fn g_max(&self) -> f64 {
        self.current_g_max
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
