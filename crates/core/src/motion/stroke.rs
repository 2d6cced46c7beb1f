use linreg::linear_regression;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};

const MIN_SPAN: f64 = 1e-6;

/// Direction of bow travel for one observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BowDirection {
    Up,
    Down,
    Stationary,
}

impl BowDirection {
    pub fn is_moving(self) -> bool {
        self != Self::Stationary
    }
}

/// Smoothed position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub timestamp_ms: f64,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl TrackedPosition {
    pub fn new(timestamp_ms: f64, point: Point) -> Self {
        Self {
            timestamp_ms,
            x: point.x,
            y: point.y,
            z: point.z,
        }
    }

    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// Position sample with its instantaneous kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub position: TrackedPosition,
    /// px/s
    pub speed: f32,
    /// px/s², signed: positive while speeding up.
    pub acceleration: f32,
}

/// A completed bow stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub direction: BowDirection,
    pub start_ms: f64,
    pub end_ms: f64,
    pub start: Point,
    pub end: Point,
    /// Mean instantaneous speed over the stroke, px/s.
    pub average_speed: f32,
    /// 0-100
    pub straightness: f32,
    /// 0-100
    pub smoothness: f32,
}

impl Stroke {
    pub fn duration_ms(&self) -> f64 {
        (self.end_ms - self.start_ms).max(0.0)
    }

    /// Straight-line distance between the stroke's end points, px.
    pub fn length(&self) -> f32 {
        geometry::distance(self.start, self.end)
    }
}

/// The stroke currently being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeInProgress {
    pub direction: BowDirection,
    pub start_ms: f64,
    pub start: Point,
    speed_sum: f64,
    samples: u32,
}

impl StrokeInProgress {
    pub fn new(direction: BowDirection, start_ms: f64, start: Point) -> Self {
        Self {
            direction,
            start_ms,
            start,
            speed_sum: 0.0,
            samples: 0,
        }
    }

    pub fn record_speed(&mut self, speed: f32) {
        self.speed_sum += f64::from(speed);
        self.samples += 1;
    }

    pub fn average_speed(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            (self.speed_sum / f64::from(self.samples)) as f32
        }
    }

    pub fn finish(self, end_ms: f64, end: Point, straightness: f32, smoothness: f32) -> Stroke {
        Stroke {
            direction: self.direction,
            start_ms: self.start_ms,
            end_ms,
            start: self.start,
            end,
            average_speed: self.average_speed(),
            straightness,
            smoothness,
        }
    }
}

/// Distance between the oldest and newest sample over the elapsed time, px/s.
/// Fewer than two samples, or no elapsed time, reads as zero.
pub fn instantaneous_speed(window: &[TrackedPosition]) -> f32 {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return 0.0;
    };
    let elapsed_s = (last.timestamp_ms - first.timestamp_ms) / 1000.0;
    if window.len() < 2 || elapsed_s <= 0.0 {
        return 0.0;
    }
    (f64::from(geometry::distance(first.point(), last.point())) / elapsed_s) as f32
}

/// Change in speed across `(timestamp_ms, speed)` samples, px/s².
pub fn acceleration(window: &[(f64, f32)]) -> f32 {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return 0.0;
    };
    let elapsed_s = (last.0 - first.0) / 1000.0;
    if window.len() < 2 || elapsed_s <= 0.0 {
        return 0.0;
    }
    (f64::from(last.1 - first.1) / elapsed_s) as f32
}

/// 0-100 score of how closely the samples follow a straight line.
///
/// Fits a least-squares line along the dominant axis of motion and scores the
/// mean absolute residual against `max_expected_deviation`. Fewer than three
/// samples, or no motion at all, score 100.
pub fn straightness(positions: &[TrackedPosition], max_expected_deviation: f32) -> f32 {
    if positions.len() < 3 {
        return 100.0;
    }

    let xs: Vec<f64> = positions.iter().map(|p| f64::from(p.x)).collect();
    let ys: Vec<f64> = positions.iter().map(|p| f64::from(p.y)).collect();
    let (span_x, span_y) = (span(&xs), span(&ys));
    if span_x < MIN_SPAN && span_y < MIN_SPAN {
        return 100.0;
    }

    let (along, across) = if span_x >= span_y { (&xs, &ys) } else { (&ys, &xs) };
    let fit = linear_regression::<_, _, f64>(along.as_slice(), across.as_slice());
    let Ok((slope, intercept)) = fit else {
        return 100.0;
    };

    let mean_deviation = along
        .iter()
        .zip(across.iter())
        .map(|(a, c)| (c - (slope * a + intercept)).abs())
        .sum::<f64>()
        / along.len() as f64;

    let score = 100.0 - (mean_deviation / f64::from(max_expected_deviation)) * 100.0;
    score.clamp(0.0, 100.0) as f32
}

/// 0-100 score from the variance of acceleration: steady strokes score high.
/// Fewer than three samples score 100.
pub fn smoothness(trajectory: &[TrajectoryPoint], max_expected_variance: f32) -> f32 {
    if trajectory.len() < 3 {
        return 100.0;
    }

    let n = trajectory.len() as f64;
    let mean = trajectory.iter().map(|t| f64::from(t.acceleration)).sum::<f64>() / n;
    let variance = trajectory
        .iter()
        .map(|t| {
            let d = f64::from(t.acceleration) - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    let score = 100.0 - (variance / f64::from(max_expected_variance)) * 100.0;
    score.clamp(0.0, 100.0) as f32
}

fn span(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    max - min
}
