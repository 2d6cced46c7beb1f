//! Scalar Kalman smoothing for keypoint coordinates.
//!
//! Each axis runs its own random-walk filter: the predict step grows the
//! uncertainty by the process noise, the update step blends prediction and
//! measurement by their relative uncertainty.

use serde::{Deserialize, Serialize};

use crate::{geometry::Point, BowingError, Result};

/// Noise constants shared by every axis filter of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Expected drift of the true position between frames, in px².
    pub process_noise: f32,
    /// Expected detector jitter, in px².
    pub measurement_noise: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            process_noise: 2.0,
            measurement_noise: 4.0,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.process_noise > 0.0) || !(self.measurement_noise > 0.0) {
            return Err(BowingError::config(
                "filter noise constants must be positive",
            ));
        }
        Ok(())
    }
}

/// One-dimensional recursive estimator.
#[derive(Debug, Clone)]
pub struct AxisFilter {
    config: FilterConfig,
    /// `None` until the first measurement seeds the estimate.
    estimate: Option<f32>,
    uncertainty: f32,
}

impl AxisFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            estimate: None,
            uncertainty: config.measurement_noise,
        }
    }

    /// Feeds one measurement and returns the smoothed value.
    ///
    /// The first measurement is adopted as-is so the track does not ramp up
    /// from the origin.
    pub fn filter(&mut self, measurement: f32) -> f32 {
        let Some(estimate) = self.estimate else {
            self.estimate = Some(measurement);
            self.uncertainty = self.config.measurement_noise;
            return measurement;
        };

        // predict
        let predicted_uncertainty = self.uncertainty + self.config.process_noise;

        // update
        let gain = predicted_uncertainty / (predicted_uncertainty + self.config.measurement_noise);
        let updated = estimate + gain * (measurement - estimate);
        self.uncertainty = (1.0 - gain) * predicted_uncertainty;
        self.estimate = Some(updated);
        updated
    }

    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }

    pub fn uncertainty(&self) -> f32 {
        self.uncertainty
    }

    pub fn reset(&mut self) {
        self.estimate = None;
        self.uncertainty = self.config.measurement_noise;
    }
}

/// Independent axis filters for one tracked point. Depth is filtered only
/// when the detector supplies it.
#[derive(Debug, Clone)]
pub struct PointFilter {
    x: AxisFilter,
    y: AxisFilter,
    z: AxisFilter,
}

impl PointFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            x: AxisFilter::new(config),
            y: AxisFilter::new(config),
            z: AxisFilter::new(config),
        }
    }

    pub fn filter(&mut self, raw: Point) -> Point {
        Point {
            x: self.x.filter(raw.x),
            y: self.y.filter(raw.y),
            z: raw.z.map(|z| self.z.filter(z)),
        }
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }
}
