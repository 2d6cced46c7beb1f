use serde::{Deserialize, Serialize};

use crate::{geometry, Landmark, PoseFrame, PostureConfig, Side};

const MIN_SHOULDER_WIDTH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoulderTension {
    Relaxed,
    Moderate,
    Tense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoulderAnalysis {
    /// Vertical offset between the shoulders / shoulder width.
    pub level_difference: f32,
    pub level: bool,
    /// The shoulder sitting higher in the image, when not level.
    pub raised_side: Option<Side>,
    /// Mean ear-to-shoulder distance / shoulder width. `None` without a
    /// visible ear.
    pub neck_ratio: Option<f32>,
    pub tension: Option<ShoulderTension>,
}

/// Shoulder level and tension. Needs both shoulders; tension additionally
/// needs at least one ear.
pub fn analyze_shoulders(frame: &PoseFrame, config: &PostureConfig) -> Option<ShoulderAnalysis> {
    let min = config.min_visibility;
    let left = frame.visible(Landmark::LeftShoulder, min)?.point();
    let right = frame.visible(Landmark::RightShoulder, min)?.point();

    let width = geometry::distance(left, right);
    if width < MIN_SHOULDER_WIDTH {
        return None;
    }

    let thresholds = &config.shoulders;
    let level_difference = (left.y - right.y).abs() / width;
    let level = level_difference < thresholds.level_tolerance;
    let raised_side = match (level, left.y < right.y) {
        (true, _) => None,
        (false, true) => Some(Side::Left),
        (false, false) => Some(Side::Right),
    };

    let neck_distances: Vec<f32> = [
        (Landmark::LeftEar, left),
        (Landmark::RightEar, right),
    ]
    .into_iter()
    .filter_map(|(ear, shoulder)| {
        frame
            .visible(ear, min)
            .map(|kp| geometry::distance(kp.point(), shoulder))
    })
    .collect();

    let neck_ratio = if neck_distances.is_empty() {
        None
    } else {
        let mean = neck_distances.iter().sum::<f32>() / neck_distances.len() as f32;
        Some(mean / width)
    };

    let tension = neck_ratio.map(|ratio| {
        if ratio < thresholds.tense_below {
            ShoulderTension::Tense
        } else if ratio < thresholds.relaxed_from {
            ShoulderTension::Moderate
        } else {
            ShoulderTension::Relaxed
        }
    });

    Some(ShoulderAnalysis {
        level_difference,
        level,
        raised_side,
        neck_ratio,
        tension,
    })
}
