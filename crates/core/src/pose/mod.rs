//! Pose-frame data model consumed from the external keypoint detector.
//!
//! Frames are read-only for the rest of the crate. Keypoints keep the name the
//! detector gave them so frames from richer models pass through untouched;
//! lookups go through the [`Landmark`] vocabulary.

mod source;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub use source::{JsonLinesSource, PoseSource, ReplaySource};

/// Body side, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Named landmarks the analysers know how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
}

impl Landmark {
    /// Snake-case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
        }
    }

    pub fn ear(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftEar,
            Side::Right => Self::RightEar,
        }
    }

    pub fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftElbow,
            Side::Right => Self::RightElbow,
        }
    }

    pub fn wrist(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftWrist,
            Side::Right => Self::RightWrist,
        }
    }

    pub fn index(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftIndex,
            Side::Right => Self::RightIndex,
        }
    }

    pub fn thumb(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftThumb,
            Side::Right => Self::RightThumb,
        }
    }

    /// Body side the landmark belongs to; `None` for the nose.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::Nose => None,
            Self::LeftEye
            | Self::LeftEar
            | Self::LeftShoulder
            | Self::LeftElbow
            | Self::LeftWrist
            | Self::LeftPinky
            | Self::LeftIndex
            | Self::LeftThumb
            | Self::LeftHip => Some(Side::Left),
            Self::RightEye
            | Self::RightEar
            | Self::RightShoulder
            | Self::RightElbow
            | Self::RightWrist
            | Self::RightPinky
            | Self::RightIndex
            | Self::RightThumb
            | Self::RightHip => Some(Side::Right),
        }
    }
}

/// A single detected landmark for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Detector confidence in [0, 1].
    pub score: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, score: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z: None,
            score,
        }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// All keypoints produced by the detector for one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Capture time in milliseconds on the producer's clock.
    pub timestamp_ms: f64,
    /// Overall pose confidence reported by the detector.
    #[serde(default)]
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    pub fn new(timestamp_ms: f64, score: f32) -> Self {
        Self {
            timestamp_ms,
            score,
            keypoints: Vec::new(),
        }
    }

    /// Builder-style helper used by tests and replay tooling.
    pub fn with(mut self, landmark: Landmark, x: f32, y: f32, score: f32) -> Self {
        self.push(Keypoint::new(landmark.as_str(), x, y, score));
        self
    }

    /// Inserts a keypoint, replacing any previous one with the same name.
    pub fn push(&mut self, keypoint: Keypoint) {
        match self.keypoints.iter_mut().find(|kp| kp.name == keypoint.name) {
            Some(existing) => *existing = keypoint,
            None => self.keypoints.push(keypoint),
        }
    }

    pub fn keypoint(&self, landmark: Landmark) -> Option<&Keypoint> {
        let name = landmark.as_str();
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Returns the keypoint only when it passes the visibility gate.
    pub fn visible(&self, landmark: Landmark, min_score: f32) -> Option<&Keypoint> {
        self.keypoint(landmark)
            .filter(|kp| crate::geometry::is_visible(Some(kp), min_score))
    }
}
