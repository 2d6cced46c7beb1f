//! Stateless per-frame posture and position analysers.
//!
//! Every analyser is a pure function of a [`PoseFrame`] and returns `None`
//! when the keypoints it needs are not visible. A missing result means
//! "insufficient data", never a technique fault. Raw geometry is normalised
//! by a body-scale reference (shoulder width, arm length) before any
//! threshold is applied, so results hold regardless of camera distance.

mod bow_arm;
mod bow_position;
mod head;
mod instrument;
mod left_hand;
mod shoulders;
mod spine;

use serde::{Deserialize, Serialize};

use crate::{PoseFrame, PostureConfig};

pub use bow_arm::{analyze_bow_arm, BowArmAnalysis, ElbowHeight};
pub use bow_position::{analyze_bow_position, arm_extension_ratio, BowPositionAnalysis, StickPosition};
pub use head::{analyze_head, HeadAnalysis, HeadPosition};
pub use instrument::{analyze_instrument, InstrumentAnalysis, ScrollHeight};
pub use left_hand::{analyze_left_hand, FingerboardPosition, LeftHandAnalysis, ThumbPlacement};
pub use shoulders::{analyze_shoulders, ShoulderAnalysis, ShoulderTension};
pub use spine::{analyze_spine, SpineAnalysis};

/// Technique faults the posture analysers can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureFault {
    UnevenShoulders,
    TenseShoulders,
    HeadTilted,
    HeadForward,
    SpineLeaning,
    ElbowTooHigh,
    ElbowTooLow,
    StiffBowWrist,
    ThumbTooHigh,
    ThumbTooLow,
    CollapsedLeftWrist,
    ScrollTooLow,
    ScrollTooHigh,
    NoChinContact,
}

impl PostureFault {
    pub fn message(self) -> &'static str {
        match self {
            Self::UnevenShoulders => "Keep both shoulders level.",
            Self::TenseShoulders => "Drop your shoulders away from your ears.",
            Self::HeadTilted => "Let the head rest on the chin rest without tilting it sideways.",
            Self::HeadForward => "Bring your head back over your shoulders.",
            Self::SpineLeaning => "Stand tall and keep the spine vertical.",
            Self::ElbowTooHigh => "Lower the bow elbow; let the arm hang from the shoulder.",
            Self::ElbowTooLow => "Raise the bow elbow to the level of the string you play.",
            Self::StiffBowWrist => "Keep the bow wrist supple, neither locked nor sharply bent.",
            Self::ThumbTooHigh => "Lower the left thumb so it does not squeeze the neck.",
            Self::ThumbTooLow => "Bring the left thumb up alongside the neck.",
            Self::CollapsedLeftWrist => "Keep the left wrist straight; avoid resting it on the neck.",
            Self::ScrollTooLow => "Raise the scroll so the violin stays level.",
            Self::ScrollTooHigh => "Lower the scroll slightly.",
            Self::NoChinContact => "Rest your jaw on the chin rest.",
        }
    }
}

/// All analyser outputs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureReport {
    pub shoulders: Option<ShoulderAnalysis>,
    pub head: Option<HeadAnalysis>,
    pub spine: Option<SpineAnalysis>,
    pub bow_arm: Option<BowArmAnalysis>,
    pub bow_position: Option<BowPositionAnalysis>,
    pub left_hand: Option<LeftHandAnalysis>,
    pub instrument: Option<InstrumentAnalysis>,
}

impl PostureReport {
    pub fn analyze(frame: &PoseFrame, config: &PostureConfig) -> Self {
        Self {
            shoulders: analyze_shoulders(frame, config),
            head: analyze_head(frame, config),
            spine: analyze_spine(frame, config),
            bow_arm: analyze_bow_arm(frame, config),
            bow_position: analyze_bow_position(frame, config),
            left_hand: analyze_left_hand(frame, config),
            instrument: analyze_instrument(frame, config),
        }
    }

    /// `true` when no analyser had enough keypoints.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Faults detected in this frame, in a stable order.
    pub fn faults(&self) -> Vec<PostureFault> {
        let mut faults = Vec::new();

        if let Some(shoulders) = &self.shoulders {
            if !shoulders.level {
                faults.push(PostureFault::UnevenShoulders);
            }
            if shoulders.tension == Some(ShoulderTension::Tense) {
                faults.push(PostureFault::TenseShoulders);
            }
        }

        match self.head.as_ref().map(|head| head.position) {
            Some(HeadPosition::TiltedLeft | HeadPosition::TiltedRight) => {
                faults.push(PostureFault::HeadTilted)
            }
            Some(HeadPosition::Forward) => faults.push(PostureFault::HeadForward),
            _ => {}
        }

        if self.spine.as_ref().is_some_and(|spine| !spine.upright) {
            faults.push(PostureFault::SpineLeaning);
        }

        if let Some(arm) = &self.bow_arm {
            match arm.elbow_height {
                ElbowHeight::TooHigh => faults.push(PostureFault::ElbowTooHigh),
                ElbowHeight::TooLow => faults.push(PostureFault::ElbowTooLow),
                ElbowHeight::Correct => {}
            }
            if arm.wrist_flexible == Some(false) {
                faults.push(PostureFault::StiffBowWrist);
            }
        }

        if let Some(hand) = &self.left_hand {
            match hand.thumb {
                Some(ThumbPlacement::TooHigh) => faults.push(PostureFault::ThumbTooHigh),
                Some(ThumbPlacement::TooLow) => faults.push(PostureFault::ThumbTooLow),
                _ => {}
            }
            if hand.wrist_straight == Some(false) {
                faults.push(PostureFault::CollapsedLeftWrist);
            }
        }

        if let Some(instrument) = &self.instrument {
            match instrument.scroll_height {
                ScrollHeight::TooLow => faults.push(PostureFault::ScrollTooLow),
                ScrollHeight::TooHigh => faults.push(PostureFault::ScrollTooHigh),
                ScrollHeight::Correct => {}
            }
            if instrument.chin_contact == Some(false) {
                faults.push(PostureFault::NoChinContact);
            }
        }

        faults
    }

    pub fn feedback(&self) -> Vec<String> {
        self.faults()
            .into_iter()
            .map(|fault| fault.message().to_string())
            .collect()
    }
}
