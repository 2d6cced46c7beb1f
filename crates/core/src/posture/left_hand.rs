use serde::{Deserialize, Serialize};

use super::bow_position::arm_extension_ratio;
use crate::{geometry, Landmark, PoseFrame, PostureConfig};

const MIN_HAND_LENGTH: f32 = 1e-3;

/// Coarse left-hand position along the fingerboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerboardPosition {
    /// Arm extended, hand near the scroll.
    First,
    /// Second to fourth position.
    Middle,
    /// Hand drawn in towards the body.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbPlacement {
    Correct,
    /// Thumb climbing above the fingers.
    TooHigh,
    /// Thumb hanging far under the neck.
    TooLow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeftHandAnalysis {
    pub extension_ratio: f32,
    pub position: FingerboardPosition,
    /// Thumb-below-index offset / wrist-to-index length.
    pub thumb_offset: Option<f32>,
    pub thumb: Option<ThumbPlacement>,
    pub wrist_angle_deg: Option<f32>,
    pub wrist_straight: Option<bool>,
}

/// Analyses the hand holding the violin. Needs that arm's shoulder, elbow and
/// wrist; thumb and wrist checks also need the index finger (and thumb).
pub fn analyze_left_hand(frame: &PoseFrame, config: &PostureConfig) -> Option<LeftHandAnalysis> {
    let min = config.min_visibility;
    let side = config.instrument_side();
    let thresholds = &config.left_hand;

    let shoulder = frame.visible(Landmark::shoulder(side), min)?.point();
    let elbow = frame.visible(Landmark::elbow(side), min)?.point();
    let wrist = frame.visible(Landmark::wrist(side), min)?.point();

    let extension_ratio = arm_extension_ratio(shoulder, elbow, wrist)?;
    let position = if extension_ratio >= thresholds.first_position_from {
        FingerboardPosition::First
    } else if extension_ratio >= thresholds.middle_positions_from {
        FingerboardPosition::Middle
    } else {
        FingerboardPosition::High
    };

    let index = frame.visible(Landmark::index(side), min).map(|kp| kp.point());
    let thumb = frame.visible(Landmark::thumb(side), min).map(|kp| kp.point());

    let thumb_offset = index.zip(thumb).and_then(|(index, thumb)| {
        let hand_length = geometry::distance(wrist, index);
        (hand_length >= MIN_HAND_LENGTH).then(|| (thumb.y - index.y) / hand_length)
    });
    let thumb = thumb_offset.map(|offset| {
        if offset < thresholds.thumb_too_high_below {
            ThumbPlacement::TooHigh
        } else if offset > thresholds.thumb_too_low_above {
            ThumbPlacement::TooLow
        } else {
            ThumbPlacement::Correct
        }
    });

    let wrist_angle_deg = index.map(|index| geometry::angle_at_vertex(elbow, wrist, index));
    let wrist_straight = wrist_angle_deg.map(|angle| angle >= thresholds.min_wrist_angle_deg);

    Some(LeftHandAnalysis {
        extension_ratio,
        position,
        thumb_offset,
        thumb,
        wrist_angle_deg,
        wrist_straight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_arm(wrist_x: f32) -> PoseFrame {
        PoseFrame::new(0.0, 1.0)
            .with(Landmark::LeftShoulder, 300.0, 200.0, 0.9)
            .with(Landmark::LeftElbow, 400.0, 230.0, 0.9)
            .with(Landmark::LeftWrist, wrist_x, 200.0, 0.9)
    }

    #[test]
    fn extended_arm_is_first_position() {
        let result = analyze_left_hand(&left_arm(500.0), &PostureConfig::default()).unwrap();

        assert_eq!(result.position, FingerboardPosition::First);
        assert!(result.thumb.is_none());
    }

    #[test]
    fn folded_arm_is_high_position() {
        let result = analyze_left_hand(&left_arm(380.0), &PostureConfig::default()).unwrap();
        assert_eq!(result.position, FingerboardPosition::High);
    }

    #[test]
    fn thumb_above_fingers_is_flagged() {
        let frame = left_arm(500.0)
            .with(Landmark::LeftIndex, 540.0, 200.0, 0.9)
            .with(Landmark::LeftThumb, 530.0, 180.0, 0.9);
        let result = analyze_left_hand(&frame, &PostureConfig::default()).unwrap();

        assert_eq!(result.thumb, Some(ThumbPlacement::TooHigh));
        assert_eq!(result.wrist_straight, Some(true));
    }

    #[test]
    fn thumb_slightly_below_is_correct() {
        let frame = left_arm(500.0)
            .with(Landmark::LeftIndex, 540.0, 200.0, 0.9)
            .with(Landmark::LeftThumb, 530.0, 210.0, 0.9);
        let result = analyze_left_hand(&frame, &PostureConfig::default()).unwrap();

        assert_eq!(result.thumb, Some(ThumbPlacement::Correct));
    }

    #[test]
    fn collapsed_wrist_is_not_straight() {
        let frame = left_arm(500.0).with(Landmark::LeftIndex, 500.0, 160.0, 0.9);
        let result = analyze_left_hand(&frame, &PostureConfig::default()).unwrap();

        assert_eq!(result.wrist_straight, Some(false));
    }

    #[test]
    fn uses_the_right_arm_for_left_handed_players() {
        let mut config = PostureConfig::default();
        config.bow_side = crate::Side::Left;

        assert!(analyze_left_hand(&left_arm(500.0), &config).is_none());
    }
}
