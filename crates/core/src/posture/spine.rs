use serde::{Deserialize, Serialize};

use crate::{geometry, Landmark, PoseFrame, PostureConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineAnalysis {
    /// Lean of the hip-midpoint → shoulder-midpoint line from vertical, degrees.
    pub lean_deg: f32,
    /// 0-100, 100 being perfectly vertical.
    pub score: f32,
    pub upright: bool,
}

pub fn analyze_spine(frame: &PoseFrame, config: &PostureConfig) -> Option<SpineAnalysis> {
    let min = config.min_visibility;
    let (shoulders, _) = geometry::midpoint(
        frame.visible(Landmark::LeftShoulder, min)?,
        frame.visible(Landmark::RightShoulder, min)?,
    );
    let (hips, _) = geometry::midpoint(
        frame.visible(Landmark::LeftHip, min)?,
        frame.visible(Landmark::RightHip, min)?,
    );

    let lean_deg = geometry::angle_from_vertical(hips, shoulders);
    let score = (100.0 - lean_deg * config.spine.penalty_per_degree).clamp(0.0, 100.0);

    Some(SpineAnalysis {
        lean_deg,
        score,
        upright: score >= config.spine.upright_score,
    })
}
