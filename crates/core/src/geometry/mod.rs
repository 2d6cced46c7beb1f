//! Pure geometric helpers over image-space points.
//!
//! Image coordinates grow rightwards in `x` and downwards in `y`. All angles
//! are returned in degrees. Degenerate input (zero-length vectors or
//! non-finite coordinates) produces `0.0` instead of `NaN`.

use serde::{Deserialize, Serialize};

use crate::Keypoint;

/// Confidence a keypoint needs before any analyser will use it.
pub const DEFAULT_MIN_VISIBILITY: f32 = 0.5;

const ZERO_LENGTH: f32 = 1e-6;

/// Position in image space, with optional relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// `true` when every present coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f32::is_finite)
    }
}

/// Angle ABC at vertex `b`, in [0, 180].
///
/// Uses the dot product of B→A and B→C. Returns `0.0` when either vector has
/// zero length or any coordinate is not finite.
pub fn angle_at_vertex(a: Point, b: Point, c: Point) -> f32 {
    let v1 = (a.x - b.x, a.y - b.y);
    let v2 = (c.x - b.x, c.y - b.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if !(mag1 >= ZERO_LENGTH && mag2 >= ZERO_LENGTH) {
        return 0.0;
    }

    let cos_angle = (v1.0 * v2.0 + v1.1 * v2.1) / (mag1 * mag2);
    if !cos_angle.is_finite() {
        return 0.0;
    }
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Direction of the vector A→B measured from the +x axis, in (-180, 180].
///
/// With `y` pointing down, a point above `a` gives a negative angle.
pub fn angle_from_horizontal(a: Point, b: Point) -> f32 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Tilt of the undirected line through `a` and `b`, folded into (-90, 90].
/// Positive when the line descends to the right.
pub fn line_tilt(a: Point, b: Point) -> f32 {
    let angle = angle_from_horizontal(a, b);
    if angle > 90.0 {
        angle - 180.0
    } else if angle <= -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// How far `top` rises above `base`, in [-90, 90], irrespective of whether
/// it sits to the left or right. 90 means straight above.
pub fn elevation(base: Point, top: Point) -> f32 {
    let rise = base.y - top.y;
    let run = (top.x - base.x).abs();
    if rise.abs() < ZERO_LENGTH && run < ZERO_LENGTH {
        return 0.0;
    }
    rise.atan2(run).to_degrees()
}

/// Unsigned deviation of the line `base`→`top` from image vertical, in [0, 180].
pub fn angle_from_vertical(base: Point, top: Point) -> f32 {
    let dx = top.x - base.x;
    let rise = base.y - top.y;
    if dx.abs() < ZERO_LENGTH && rise.abs() < ZERO_LENGTH {
        return 0.0;
    }
    dx.atan2(rise).to_degrees().abs()
}

/// Euclidean distance in the image plane.
pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance including depth, when both points carry it.
pub fn distance_3d(a: Point, b: Point) -> Option<f32> {
    let dz = b.z? - a.z?;
    let planar = distance(a, b);
    Some((planar * planar + dz * dz).sqrt())
}

/// Midpoint of two keypoints with its confidence. The result is only as
/// trustworthy as the weaker input, so it takes the lower score.
pub fn midpoint(a: &Keypoint, b: &Keypoint) -> (Point, f32) {
    let z = match (a.z, b.z) {
        (Some(za), Some(zb)) => Some((za + zb) * 0.5),
        _ => None,
    };
    let point = Point {
        x: (a.x + b.x) * 0.5,
        y: (a.y + b.y) * 0.5,
        z,
    };
    (point, a.score.min(b.score))
}

/// `false` when the keypoint is missing, scored below `min_score`, or has a
/// non-finite coordinate. The threshold itself counts as visible.
pub fn is_visible(keypoint: Option<&Keypoint>, min_score: f32) -> bool {
    keypoint.map_or(false, |kp| kp.score >= min_score && kp.point().is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn straight_and_right_angles() {
        assert!((angle_at_vertex(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)) - 180.0).abs() < 0.01);
        assert!((angle_at_vertex(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)) - 90.0).abs() < 0.01);
    }

    #[test]
    fn degenerate_vertex_angle_is_zero() {
        let b = p(3.0, 4.0);
        let angle = angle_at_vertex(p(0.0, 0.0), b, b);

        assert_eq!(angle, 0.0);
        assert!(!angle.is_nan());
    }

    #[test]
    fn horizontal_angle_follows_atan2() {
        assert!((angle_from_horizontal(p(0.0, 0.0), p(1.0, 1.0)) - 45.0).abs() < 0.01);
        assert!((angle_from_horizontal(p(0.0, 0.0), p(0.0, -1.0)) + 90.0).abs() < 0.01);
    }

    #[test]
    fn line_tilt_ignores_point_order() {
        let a = p(0.0, 0.0);
        let b = p(10.0, 2.0);
        assert!((line_tilt(a, b) - line_tilt(b, a)).abs() < 0.01);
        assert!(line_tilt(a, b) > 0.0);
    }

    #[test]
    fn elevation_is_mirror_symmetric() {
        let base = p(0.0, 0.0);
        assert!((elevation(base, p(0.0, -5.0)) - 90.0).abs() < 0.01);
        assert!((elevation(base, p(5.0, -5.0)) - elevation(base, p(-5.0, -5.0))).abs() < 0.01);
        assert!(elevation(base, p(5.0, 5.0)) < 0.0);
    }

    #[test]
    fn vertical_deviation() {
        assert!(angle_from_vertical(p(0.0, 10.0), p(0.0, 0.0)).abs() < 0.01);
        assert!((angle_from_vertical(p(0.0, 10.0), p(10.0, 0.0)) - 45.0).abs() < 0.01);
    }

    #[test]
    fn distances() {
        assert_eq!(distance(p(0.0, 0.0), p(3.0, 4.0)), 5.0);
        assert_eq!(distance_3d(p(0.0, 0.0), p(3.0, 4.0)), None);
        let d = distance_3d(Point::with_z(0.0, 0.0, 0.0), Point::with_z(0.0, 3.0, 4.0));
        assert_eq!(d, Some(5.0));
    }

    #[test]
    fn midpoint_takes_weaker_confidence() {
        let a = Keypoint::new("left_shoulder", 0.0, 0.0, 0.9);
        let b = Keypoint::new("right_shoulder", 10.0, 4.0, 0.6);
        let (mid, score) = midpoint(&a, &b);

        assert_eq!(mid, Point::new(5.0, 2.0));
        assert_eq!(score, 0.6);
    }

    #[test]
    fn non_finite_input_gives_zero_angle() {
        assert_eq!(angle_at_vertex(p(f32::NAN, 0.0), p(1.0, 0.0), p(2.0, 0.0)), 0.0);
        assert_eq!(angle_at_vertex(p(0.0, 0.0), p(1.0, 0.0), p(f32::INFINITY, 1.0)), 0.0);
    }

    #[test]
    fn non_finite_keypoints_are_not_visible() {
        let nan = Keypoint::new("nose", f32::NAN, 0.0, 0.9);
        let inf = Keypoint::new("nose", 0.0, f32::NEG_INFINITY, 0.9);
        let bad_depth = Keypoint::new("nose", 0.0, 0.0, 0.9).with_z(f32::NAN);

        assert!(!is_visible(Some(&nan), 0.5));
        assert!(!is_visible(Some(&inf), 0.5));
        assert!(!is_visible(Some(&bad_depth), 0.5));
    }

    #[test]
    fn visibility_boundary_is_inclusive() {
        let kp = Keypoint::new("nose", 0.0, 0.0, 0.5);
        assert!(is_visible(Some(&kp), 0.5));

        let below = Keypoint::new("nose", 0.0, 0.0, 0.5 - 1e-4);
        assert!(!is_visible(Some(&below), 0.5));
        assert!(!is_visible(None, 0.5));
    }
}
