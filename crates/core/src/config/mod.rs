//! Tunable constants for the analysers and the motion tracker.
//!
//! Every threshold was chosen empirically and is expected to need
//! per-deployment tuning, so all of them live here rather than inline.
//! Distances are in the detector's pixel space unless stated otherwise;
//! "ratio" values are normalised by a body-scale reference and unitless.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{filter::FilterConfig, BowingError, Landmark, Result, Side};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub posture: PostureConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Switches both the tracker and the posture analysers to a player who
    /// bows with `side`.
    pub fn with_bow_side(mut self, side: Side) -> Self {
        self.tracker.bow_side = side;
        self.tracker.tracked_landmark = Landmark::wrist(side);
        self.posture.bow_side = side;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.posture.validate()?;
        if self.tracker.bow_side != self.posture.bow_side {
            return Err(BowingError::config(format!(
                "tracker bow_side ({:?}) and posture bow_side ({:?}) disagree",
                self.tracker.bow_side, self.posture.bow_side
            )));
        }
        Ok(())
    }
}

/// Maps horizontal image motion onto bow direction. Which one holds depends
/// on the player's handedness and on whether the camera image is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionConvention {
    /// Hand moving towards larger `x` is a down-bow (mirrored selfie view of
    /// a right-handed player).
    RightwardIsDown,
    /// Hand moving towards larger `x` is an up-bow.
    RightwardIsUp,
}

impl Default for DirectionConvention {
    fn default() -> Self {
        Self::RightwardIsDown
    }
}

/// Bucket boundaries along the bow, expressed as a fraction of the
/// frog-to-tip length (0 = frog, 1 = tip).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickThresholds {
    pub frog_below: f32,
    pub lower_below: f32,
    pub middle_below: f32,
    pub upper_below: f32,
}

impl Default for StickThresholds {
    fn default() -> Self {
        Self {
            frog_below: 0.35,
            lower_below: 0.55,
            middle_below: 0.75,
            upper_below: 0.9,
        }
    }
}

impl StickThresholds {
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            self.frog_below,
            self.lower_below,
            self.middle_below,
            self.upper_below,
        ];
        let increasing = bounds.windows(2).all(|pair| pair[0] < pair[1]);
        let in_range = bounds.iter().all(|b| *b > 0.0 && *b <= 1.0);
        if !increasing || !in_range {
            return Err(BowingError::config(
                "stick thresholds must be strictly increasing within (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Limits used by the suggestion rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionThresholds {
    /// Straightness score (0-100) below which the stroke is called crooked.
    pub min_straightness: f32,
    /// Average stroke speed above which the player is rushing, px/s.
    pub max_speed: f32,
    /// Average stroke speed below which the player is starving the bow, px/s.
    pub min_speed: f32,
}

impl Default for SuggestionThresholds {
    fn default() -> Self {
        Self {
            min_straightness: 70.0,
            max_speed: 900.0,
            min_speed: 40.0,
        }
    }
}

/// Settings for [`crate::MotionTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Arm that holds the bow.
    pub bow_side: Side,
    /// Landmark whose motion stands in for the bow.
    pub tracked_landmark: Landmark,
    /// Confidence the tracked landmark needs before the tracker advances.
    pub min_confidence: f32,
    /// Position and trajectory samples kept (about one second at 30 fps).
    pub history_capacity: usize,
    /// Completed strokes kept.
    pub stroke_history_capacity: usize,
    /// Samples spanned by the instantaneous velocity estimate.
    pub velocity_window: usize,
    /// Velocity samples spanned by the acceleration estimate.
    pub acceleration_window: usize,
    /// Samples compared when deciding the bow direction.
    pub direction_window: usize,
    /// Horizontal travel across the direction window below which the bow is
    /// stationary, px.
    pub min_movement: f32,
    /// Samples used for the straightness line fit.
    pub straightness_window: usize,
    /// Mean deviation from the fitted line that scores zero, px.
    pub max_expected_deviation: f32,
    /// Trajectory samples used for the smoothness estimate.
    pub smoothness_window: usize,
    /// Acceleration variance that scores zero smoothness, (px/s²)².
    pub max_expected_acceleration_variance: f32,
    /// Smoothness (0-100) at or below which a bow change counts as rough.
    pub bow_change_smoothness_threshold: f32,
    /// Completed strokes reported and averaged in each analysis.
    pub recent_stroke_count: usize,
    pub max_suggestions: usize,
    pub direction_convention: DirectionConvention,
    /// Bow length assumed when no calibration is available, px.
    pub estimated_bow_length: f32,
    pub filter: FilterConfig,
    pub stick: StickThresholds,
    pub suggestions: SuggestionThresholds,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bow_side: Side::Right,
            tracked_landmark: Landmark::RightWrist,
            min_confidence: 0.5,
            history_capacity: 30,
            stroke_history_capacity: 20,
            velocity_window: 5,
            acceleration_window: 5,
            direction_window: 10,
            min_movement: 5.0,
            straightness_window: 20,
            max_expected_deviation: 50.0,
            smoothness_window: 20,
            max_expected_acceleration_variance: 2.0e7,
            bow_change_smoothness_threshold: 70.0,
            recent_stroke_count: 5,
            max_suggestions: 3,
            direction_convention: DirectionConvention::default(),
            estimated_bow_length: 300.0,
            filter: FilterConfig::default(),
            stick: StickThresholds::default(),
            suggestions: SuggestionThresholds::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tracked_landmark.side() != Some(self.bow_side) {
            return Err(BowingError::config(format!(
                "tracked_landmark {} is not on the bow side ({:?}); use with_bow_side",
                self.tracked_landmark.as_str(),
                self.bow_side
            )));
        }
        if self.history_capacity == 0 || self.stroke_history_capacity == 0 {
            return Err(BowingError::config("buffer capacities must be at least 1"));
        }

        let windows = [
            ("velocity_window", self.velocity_window),
            ("acceleration_window", self.acceleration_window),
            ("direction_window", self.direction_window),
            ("straightness_window", self.straightness_window),
            ("smoothness_window", self.smoothness_window),
        ];
        for (name, window) in windows {
            if window < 2 || window > self.history_capacity {
                return Err(BowingError::config(format!(
                    "{name} must lie between 2 and history_capacity ({}), got {window}",
                    self.history_capacity
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(BowingError::config("min_confidence must lie within [0, 1]"));
        }
        if !(self.min_movement >= 0.0) {
            return Err(BowingError::config("min_movement must not be negative"));
        }
        if !(self.max_expected_deviation > 0.0)
            || !(self.max_expected_acceleration_variance > 0.0)
            || !(self.estimated_bow_length > 0.0)
        {
            return Err(BowingError::config(
                "max_expected_deviation, max_expected_acceleration_variance and \
                 estimated_bow_length must be positive",
            ));
        }

        self.filter.validate()?;
        self.stick.validate()
    }
}

/// Shoulder level and tension thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoulderThresholds {
    /// Height difference / shoulder width below which shoulders are level.
    pub level_tolerance: f32,
    /// Ear-to-shoulder distance / shoulder width below which shoulders are
    /// raised (tense).
    pub tense_below: f32,
    /// Ear-to-shoulder distance / shoulder width from which shoulders are
    /// relaxed.
    pub relaxed_from: f32,
}

impl Default for ShoulderThresholds {
    fn default() -> Self {
        Self {
            level_tolerance: 0.1,
            tense_below: 0.45,
            relaxed_from: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadThresholds {
    /// Ear-line tilt beyond which the head counts as tilted, degrees.
    pub max_tilt_deg: f32,
    /// Nose elevation above the shoulder midpoint below which the head is
    /// pushed forward, degrees (90 = directly above).
    pub min_nose_elevation_deg: f32,
}

impl Default for HeadThresholds {
    fn default() -> Self {
        Self {
            max_tilt_deg: 15.0,
            min_nose_elevation_deg: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpineThresholds {
    /// Score lost per degree of lean from vertical.
    pub penalty_per_degree: f32,
    /// Score (0-100) from which the spine counts as upright.
    pub upright_score: f32,
}

impl Default for SpineThresholds {
    fn default() -> Self {
        Self {
            penalty_per_degree: 3.0,
            upright_score: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BowArmThresholds {
    /// Elbow-above-shoulder offset / shoulder-to-wrist distance below which
    /// the elbow is too high.
    pub too_high_below: f32,
    /// Elbow-below-shoulder offset / shoulder-to-wrist distance above which
    /// the elbow is too low.
    pub too_low_above: f32,
    /// Wrist angle range (degrees) that counts as flexible.
    pub flexible_wrist_min_deg: f32,
    pub flexible_wrist_max_deg: f32,
}

impl Default for BowArmThresholds {
    fn default() -> Self {
        Self {
            too_high_below: -0.15,
            too_low_above: 0.25,
            flexible_wrist_min_deg: 140.0,
            flexible_wrist_max_deg: 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeftHandThresholds {
    /// Arm extension ratio from which the hand sits in first position.
    pub first_position_from: f32,
    /// Arm extension ratio from which the hand sits in the middle positions;
    /// anything shorter is a high position.
    pub middle_positions_from: f32,
    /// Thumb-below-index offset / hand length below which the thumb is
    /// climbing over the neck.
    pub thumb_too_high_below: f32,
    /// Thumb-below-index offset / hand length above which the thumb hangs
    /// under the neck.
    pub thumb_too_low_above: f32,
    /// Wrist angle below which the wrist has collapsed, degrees.
    pub min_wrist_angle_deg: f32,
}

impl Default for LeftHandThresholds {
    fn default() -> Self {
        Self {
            first_position_from: 0.8,
            middle_positions_from: 0.6,
            thumb_too_high_below: -0.1,
            thumb_too_low_above: 0.8,
            min_wrist_angle_deg: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentThresholds {
    /// Scroll elevation above the left shoulder below which the violin
    /// droops, degrees.
    pub too_low_below_deg: f32,
    /// Scroll elevation above which the violin points upwards, degrees.
    pub too_high_above_deg: f32,
    /// Nose-to-left-shoulder distance / shoulder width up to which the chin
    /// is on the chin rest.
    pub chin_contact_max_ratio: f32,
}

impl Default for InstrumentThresholds {
    fn default() -> Self {
        Self {
            too_low_below_deg: 0.0,
            too_high_above_deg: 35.0,
            chin_contact_max_ratio: 0.6,
        }
    }
}

/// Settings for the per-frame posture analysers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    pub bow_side: Side,
    /// Confidence every keypoint needs before an analyser uses it.
    pub min_visibility: f32,
    pub shoulders: ShoulderThresholds,
    pub head: HeadThresholds,
    pub spine: SpineThresholds,
    pub bow_arm: BowArmThresholds,
    pub stick: StickThresholds,
    pub left_hand: LeftHandThresholds,
    pub instrument: InstrumentThresholds,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            bow_side: Side::Right,
            min_visibility: crate::geometry::DEFAULT_MIN_VISIBILITY,
            shoulders: ShoulderThresholds::default(),
            head: HeadThresholds::default(),
            spine: SpineThresholds::default(),
            bow_arm: BowArmThresholds::default(),
            stick: StickThresholds::default(),
            left_hand: LeftHandThresholds::default(),
            instrument: InstrumentThresholds::default(),
        }
    }
}

impl PostureConfig {
    /// Side holding the violin.
    pub fn instrument_side(&self) -> Side {
        self.bow_side.opposite()
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(BowingError::config("min_visibility must lie within [0, 1]"));
        }
        if self.shoulders.tense_below > self.shoulders.relaxed_from {
            return Err(BowingError::config(
                "shoulder tense_below must not exceed relaxed_from",
            ));
        }
        if self.bow_arm.too_high_below >= self.bow_arm.too_low_above {
            return Err(BowingError::config(
                "bow arm too_high_below must be below too_low_above",
            ));
        }
        if self.left_hand.middle_positions_from > self.left_hand.first_position_from {
            return Err(BowingError::config(
                "left hand middle_positions_from must not exceed first_position_from",
            ));
        }
        self.stick.validate()
    }
}
