use serde::{Deserialize, Serialize};

use crate::{config::StickThresholds, geometry, geometry::Point, Landmark, PoseFrame, PostureConfig};

const MIN_ARM_LENGTH: f32 = 1e-3;

/// Where along the bow the hair meets the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickPosition {
    Frog,
    Lower,
    Middle,
    Upper,
    Tip,
}

impl StickPosition {
    /// Buckets a frog-relative fraction of the bow (0 = frog, 1 = tip).
    pub fn from_ratio(ratio: f32, thresholds: &StickThresholds) -> Self {
        if ratio < thresholds.frog_below {
            Self::Frog
        } else if ratio < thresholds.lower_below {
            Self::Lower
        } else if ratio < thresholds.middle_below {
            Self::Middle
        } else if ratio < thresholds.upper_below {
            Self::Upper
        } else {
            Self::Tip
        }
    }
}

/// Straight-line shoulder→wrist distance over the folded arm length. Close to
/// 1 with the arm extended (tip), small with the elbow bent (frog).
pub fn arm_extension_ratio(shoulder: Point, elbow: Point, wrist: Point) -> Option<f32> {
    let arm_length = geometry::distance(shoulder, elbow) + geometry::distance(elbow, wrist);
    if arm_length < MIN_ARM_LENGTH {
        return None;
    }
    Some((geometry::distance(shoulder, wrist) / arm_length).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowPositionAnalysis {
    pub extension_ratio: f32,
    pub position: StickPosition,
}

pub fn analyze_bow_position(
    frame: &PoseFrame,
    config: &PostureConfig,
) -> Option<BowPositionAnalysis> {
    let min = config.min_visibility;
    let side = config.bow_side;
    let shoulder = frame.visible(Landmark::shoulder(side), min)?.point();
    let elbow = frame.visible(Landmark::elbow(side), min)?.point();
    let wrist = frame.visible(Landmark::wrist(side), min)?.point();

    let extension_ratio = arm_extension_ratio(shoulder, elbow, wrist)?;
    Some(BowPositionAnalysis {
        extension_ratio,
        position: StickPosition::from_ratio(extension_ratio, &config.stick),
    })
}
