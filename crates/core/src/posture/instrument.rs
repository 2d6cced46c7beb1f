use serde::{Deserialize, Serialize};

use crate::{geometry, Landmark, PoseFrame, PostureConfig};

const MIN_SHOULDER_WIDTH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollHeight {
    TooLow,
    Correct,
    TooHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentAnalysis {
    /// Elevation of the scroll above the instrument-side shoulder, degrees.
    pub scroll_elevation_deg: f32,
    pub scroll_height: ScrollHeight,
    /// Direction of the shoulder → scroll line from image horizontal.
    pub violin_angle_deg: f32,
    /// Nose-to-shoulder distance / shoulder width; uses depth when every
    /// keypoint involved carries it.
    pub chin_ratio: Option<f32>,
    pub chin_contact: Option<bool>,
}

/// Infers violin hold from the instrument-side arm. No instrument keypoints
/// exist, so the scroll is approximated by the index finger (or the wrist
/// when the finger is hidden).
pub fn analyze_instrument(frame: &PoseFrame, config: &PostureConfig) -> Option<InstrumentAnalysis> {
    let min = config.min_visibility;
    let side = config.instrument_side();
    let thresholds = &config.instrument;

    let shoulder = frame.visible(Landmark::shoulder(side), min)?.point();
    let scroll = frame
        .visible(Landmark::index(side), min)
        .or_else(|| frame.visible(Landmark::wrist(side), min))?
        .point();

    let scroll_elevation_deg = geometry::elevation(shoulder, scroll);
    let scroll_height = if scroll_elevation_deg < thresholds.too_low_below_deg {
        ScrollHeight::TooLow
    } else if scroll_elevation_deg > thresholds.too_high_above_deg {
        ScrollHeight::TooHigh
    } else {
        ScrollHeight::Correct
    };

    let chin_ratio = frame
        .visible(Landmark::Nose, min)
        .zip(frame.visible(Landmark::shoulder(side.opposite()), min))
        .and_then(|(nose, other_shoulder)| {
            let nose = nose.point();
            let other = other_shoulder.point();
            let (reach, width) = match (
                geometry::distance_3d(nose, shoulder),
                geometry::distance_3d(shoulder, other),
            ) {
                (Some(reach), Some(width)) => (reach, width),
                _ => (
                    geometry::distance(nose, shoulder),
                    geometry::distance(shoulder, other),
                ),
            };
            (width >= MIN_SHOULDER_WIDTH).then(|| reach / width)
        });

    Some(InstrumentAnalysis {
        scroll_elevation_deg,
        scroll_height,
        violin_angle_deg: geometry::angle_from_horizontal(shoulder, scroll),
        chin_ratio,
        chin_contact: chin_ratio.map(|ratio| ratio <= thresholds.chin_contact_max_ratio),
    })
}
