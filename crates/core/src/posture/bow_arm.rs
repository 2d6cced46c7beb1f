use serde::{Deserialize, Serialize};

use crate::{geometry, Landmark, PoseFrame, PostureConfig};

const MIN_REACH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElbowHeight {
    TooHigh,
    Correct,
    TooLow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowArmAnalysis {
    pub elbow_angle_deg: f32,
    /// Elbow offset below the shoulder / shoulder-to-wrist distance. Negative
    /// when the elbow sits above the shoulder.
    pub elbow_height_ratio: f32,
    pub elbow_height: ElbowHeight,
    /// Angle at the wrist between forearm and index finger. Needs the index.
    pub wrist_angle_deg: Option<f32>,
    pub wrist_flexible: Option<bool>,
}

pub fn analyze_bow_arm(frame: &PoseFrame, config: &PostureConfig) -> Option<BowArmAnalysis> {
    let min = config.min_visibility;
    let side = config.bow_side;
    let thresholds = &config.bow_arm;

    let shoulder = frame.visible(Landmark::shoulder(side), min)?.point();
    let elbow = frame.visible(Landmark::elbow(side), min)?.point();
    let wrist = frame.visible(Landmark::wrist(side), min)?.point();

    let reach = geometry::distance(shoulder, wrist);
    if reach < MIN_REACH {
        return None;
    }

    let elbow_angle_deg = geometry::angle_at_vertex(shoulder, elbow, wrist);
    let elbow_height_ratio = (elbow.y - shoulder.y) / reach;
    let elbow_height = if elbow_height_ratio < thresholds.too_high_below {
        ElbowHeight::TooHigh
    } else if elbow_height_ratio > thresholds.too_low_above {
        ElbowHeight::TooLow
    } else {
        ElbowHeight::Correct
    };

    let wrist_angle_deg = frame
        .visible(Landmark::index(side), min)
        .map(|index| geometry::angle_at_vertex(elbow, wrist, index.point()));
    let wrist_flexible = wrist_angle_deg.map(|angle| {
        (thresholds.flexible_wrist_min_deg..=thresholds.flexible_wrist_max_deg).contains(&angle)
    });

    Some(BowArmAnalysis {
        elbow_angle_deg,
        elbow_height_ratio,
        elbow_height,
        wrist_angle_deg,
        wrist_flexible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm(elbow_y: f32) -> PoseFrame {
        PoseFrame::new(0.0, 1.0)
            .with(Landmark::RightShoulder, 100.0, 100.0, 0.9)
            .with(Landmark::RightElbow, 50.0, elbow_y, 0.9)
            .with(Landmark::RightWrist, 0.0, 100.0, 0.9)
    }

    #[test]
    fn level_elbow_is_correct() {
        let result = analyze_bow_arm(&arm(110.0), &PostureConfig::default()).unwrap();

        assert_eq!(result.elbow_height, ElbowHeight::Correct);
        assert!(result.wrist_angle_deg.is_none());
    }

    #[test]
    fn raised_elbow_is_too_high() {
        let result = analyze_bow_arm(&arm(70.0), &PostureConfig::default()).unwrap();
        assert_eq!(result.elbow_height, ElbowHeight::TooHigh);
    }

    #[test]
    fn dropped_elbow_is_too_low() {
        let result = analyze_bow_arm(&arm(140.0), &PostureConfig::default()).unwrap();
        assert_eq!(result.elbow_height, ElbowHeight::TooLow);
        assert!(result.elbow_angle_deg < 120.0);
    }

    #[test]
    fn wrist_flexibility_uses_index_finger() {
        let straight = arm(100.0).with(Landmark::RightIndex, -20.0, 95.0, 0.9);
        let result = analyze_bow_arm(&straight, &PostureConfig::default()).unwrap();
        assert_eq!(result.wrist_flexible, Some(true));

        let bent = arm(100.0).with(Landmark::RightIndex, 0.0, 130.0, 0.9);
        let result = analyze_bow_arm(&bent, &PostureConfig::default()).unwrap();
        assert_eq!(result.wrist_flexible, Some(false));
    }

    #[test]
    fn hidden_wrist_means_no_result() {
        let frame = arm(100.0).with(Landmark::RightWrist, 0.0, 100.0, 0.1);
        assert!(analyze_bow_arm(&frame, &PostureConfig::default()).is_none());
    }
}
