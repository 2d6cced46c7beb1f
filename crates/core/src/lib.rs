//! Core library for the Bowing Coach application.
//!
//! The crate turns a stream of 2D pose keypoints of a violinist into posture
//! feedback and bow-stroke analysis. Each module owns one stage: pose input,
//! signal smoothing, stateless posture analysers, the stateful motion
//! tracker, and the per-session report that ties them together.

pub mod buffer;
pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod motion;
pub mod pose;
pub mod posture;
pub mod report;
pub mod session;

pub use config::{AppConfig, DirectionConvention, PostureConfig, TrackerConfig};
pub use error::{BowingError, Result};
pub use geometry::Point;
pub use motion::{BowDirection, CalibrationReference, MotionTracker, Stroke};
pub use pose::{JsonLinesSource, Keypoint, Landmark, PoseFrame, PoseSource, ReplaySource, Side};
pub use posture::{PostureFault, PostureReport, StickPosition};
pub use report::{BowingAnalysis, Suggestion, SuggestionKind};
pub use session::{FrameReport, PracticeSession, SessionSummary};
