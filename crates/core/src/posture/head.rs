use serde::{Deserialize, Serialize};

use crate::{geometry, Landmark, PoseFrame, PostureConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadPosition {
    Correct,
    TiltedLeft,
    TiltedRight,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadAnalysis {
    pub position: HeadPosition,
    /// Ear-line tilt in degrees, positive when the line descends to the right
    /// of the image.
    pub tilt_deg: Option<f32>,
    /// Elevation of the nose above the shoulder midpoint, degrees.
    pub nose_elevation_deg: Option<f32>,
}

/// Head tilt from the ear line, forward push from the nose relative to the
/// shoulders. Tilt takes precedence when both are off.
pub fn analyze_head(frame: &PoseFrame, config: &PostureConfig) -> Option<HeadAnalysis> {
    let min = config.min_visibility;
    let thresholds = &config.head;

    let ears = frame
        .visible(Landmark::LeftEar, min)
        .zip(frame.visible(Landmark::RightEar, min));
    let tilt = ears.map(|(left, right)| {
        let tilt = geometry::line_tilt(left.point(), right.point());
        (tilt, left.y > right.y)
    });

    let shoulders = frame
        .visible(Landmark::LeftShoulder, min)
        .zip(frame.visible(Landmark::RightShoulder, min));
    let nose_elevation = frame
        .visible(Landmark::Nose, min)
        .zip(shoulders)
        .map(|(nose, (left, right))| {
            let (base, _) = geometry::midpoint(left, right);
            geometry::elevation(base, nose.point())
        });

    if tilt.is_none() && nose_elevation.is_none() {
        return None;
    }

    let position = match (tilt, nose_elevation) {
        (Some((angle, left_ear_lower)), _) if angle.abs() > thresholds.max_tilt_deg => {
            if left_ear_lower {
                HeadPosition::TiltedLeft
            } else {
                HeadPosition::TiltedRight
            }
        }
        (_, Some(elevation)) if elevation < thresholds.min_nose_elevation_deg => {
            HeadPosition::Forward
        }
        _ => HeadPosition::Correct,
    };

    Some(HeadAnalysis {
        position,
        tilt_deg: tilt.map(|(angle, _)| angle),
        nose_elevation_deg: nose_elevation,
    })
}
