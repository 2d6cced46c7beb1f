//! Stroke segmentation for the bow hand.
//!
//! [`MotionTracker`] consumes one [`PoseFrame`] per call, smooths the tracked
//! landmark, keeps about a second of position and trajectory history, and
//! splits the motion into strokes whenever the bow changes direction.
//! Stationary windows never open or close a stroke. A tracker belongs to
//! exactly one subject and session; run several trackers for several
//! subjects.

mod stroke;

use serde::{Deserialize, Serialize};

use crate::{
    buffer::RingBuffer,
    config::DirectionConvention,
    filter::PointFilter,
    geometry::{self, Point},
    posture::{arm_extension_ratio, StickPosition},
    report::BowingAnalysis,
    BowingError, Landmark, PoseFrame, Result, TrackerConfig,
};

pub use stroke::{
    acceleration, instantaneous_speed, smoothness, straightness, BowDirection, Stroke,
    StrokeInProgress, TrackedPosition, TrajectoryPoint,
};

/// Frog and tip reference positions of the bow hand, captured by the caller
/// while the player holds the bow at each end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReference {
    pub frog: Point,
    pub tip: Point,
}

impl CalibrationReference {
    const MIN_BOW_LENGTH: f32 = 1.0;

    pub fn new(frog: Point, tip: Point) -> Result<Self> {
        let length = geometry::distance(frog, tip);
        if !(length >= Self::MIN_BOW_LENGTH) {
            return Err(BowingError::InvalidCalibration(format!(
                "frog and tip are {length:.2} px apart; at least {} px required",
                Self::MIN_BOW_LENGTH
            )));
        }
        Ok(Self { frog, tip })
    }

    pub fn bow_length(&self) -> f32 {
        geometry::distance(self.frog, self.tip)
    }

    /// Projects `point` onto the frog→tip segment: 0 at the frog, 1 at the tip.
    pub fn fraction_along(&self, point: Point) -> f32 {
        let axis = (self.tip.x - self.frog.x, self.tip.y - self.frog.y);
        let offset = (point.x - self.frog.x, point.y - self.frog.y);
        let length_sq = axis.0 * axis.0 + axis.1 * axis.1;
        ((offset.0 * axis.0 + offset.1 * axis.1) / length_sq).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct MotionTracker {
    config: TrackerConfig,
    filter: PointFilter,
    positions: RingBuffer<TrackedPosition>,
    trajectory: RingBuffer<TrajectoryPoint>,
    strokes: RingBuffer<Stroke>,
    current_stroke: Option<StrokeInProgress>,
    direction: BowDirection,
    last_moving_direction: Option<BowDirection>,
    calibration: Option<CalibrationReference>,
    stick_position: Option<StickPosition>,
    straightness: f32,
    smoothness: f32,
    completed_strokes: u64,
}

impl MotionTracker {
    /// Validates `config`; invalid capacities or windows are rejected here so
    /// per-frame updates never fail.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            filter: PointFilter::new(config.filter),
            positions: RingBuffer::new(config.history_capacity)?,
            trajectory: RingBuffer::new(config.history_capacity)?,
            strokes: RingBuffer::new(config.stroke_history_capacity)?,
            current_stroke: None,
            direction: BowDirection::Stationary,
            last_moving_direction: None,
            calibration: None,
            stick_position: None,
            straightness: 100.0,
            smoothness: 100.0,
            completed_strokes: 0,
            config,
        })
    }

    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default()).expect("default tracker config is valid")
    }

    /// Ingests one frame. Returns `None`, leaving all history untouched, when
    /// the tracked landmark is missing or below the confidence threshold.
    pub fn update(&mut self, frame: &PoseFrame) -> Option<BowingAnalysis> {
        let Some(keypoint) = frame.visible(self.config.tracked_landmark, self.config.min_confidence)
        else {
            tracing::trace!(
                timestamp_ms = frame.timestamp_ms,
                landmark = self.config.tracked_landmark.as_str(),
                "tracking lost"
            );
            return None;
        };

        let smoothed = self.filter.filter(keypoint.point());
        let position = TrackedPosition::new(frame.timestamp_ms, smoothed);
        self.positions.push(position);

        let speed = self.current_velocity();
        let acceleration = self.current_acceleration(frame.timestamp_ms, speed);
        self.trajectory.push(TrajectoryPoint {
            position,
            speed,
            acceleration,
        });

        self.direction = self.detect_direction();
        if self.direction.is_moving() && Some(self.direction) != self.last_moving_direction {
            self.change_stroke(self.direction, position);
        }
        if let Some(stroke) = self.current_stroke.as_mut() {
            stroke.record_speed(speed);
        }

        self.stick_position = self.estimate_stick_position(frame, smoothed);
        self.straightness = self.window_straightness();
        self.smoothness = self.window_smoothness();

        Some(self.analysis())
    }

    /// Read-only snapshot of the current tracker state.
    pub fn analysis(&self) -> BowingAnalysis {
        BowingAnalysis::from_tracker(self)
    }

    /// Sets frog/tip references used for stick-position estimates.
    pub fn calibrate(&mut self, frog: Point, tip: Point) -> Result<()> {
        let reference = CalibrationReference::new(frog, tip)?;
        tracing::debug!(
            bow_length = reference.bow_length(),
            "bow calibration updated"
        );
        self.calibration = Some(reference);
        Ok(())
    }

    pub fn clear_calibration(&mut self) {
        self.calibration = None;
    }

    /// Clears buffers, filter state, strokes and calibration. Configuration
    /// is kept.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.positions.clear();
        self.trajectory.clear();
        self.strokes.clear();
        self.current_stroke = None;
        self.direction = BowDirection::Stationary;
        self.last_moving_direction = None;
        self.calibration = None;
        self.stick_position = None;
        self.straightness = 100.0;
        self.smoothness = 100.0;
        self.completed_strokes = 0;
        tracing::debug!("motion tracker reset");
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn direction(&self) -> BowDirection {
        self.direction
    }

    pub fn current_stroke(&self) -> Option<&StrokeInProgress> {
        self.current_stroke.as_ref()
    }

    /// Completed strokes, oldest first.
    pub fn strokes(&self) -> impl DoubleEndedIterator<Item = &Stroke> + ExactSizeIterator {
        self.strokes.iter()
    }

    /// Strokes completed since construction or the last reset, including
    /// those already evicted from history.
    pub fn completed_stroke_count(&self) -> u64 {
        self.completed_strokes
    }

    pub fn positions(&self) -> impl DoubleEndedIterator<Item = &TrackedPosition> + ExactSizeIterator {
        self.positions.iter()
    }

    pub fn trajectory(&self) -> impl DoubleEndedIterator<Item = &TrajectoryPoint> + ExactSizeIterator {
        self.trajectory.iter()
    }

    pub fn calibration(&self) -> Option<&CalibrationReference> {
        self.calibration.as_ref()
    }

    pub fn stick_position(&self) -> Option<StickPosition> {
        self.stick_position
    }

    /// Speed of the latest sample, px/s.
    pub fn speed(&self) -> f32 {
        self.trajectory.newest().map(|t| t.speed).unwrap_or(0.0)
    }

    pub fn straightness(&self) -> f32 {
        self.straightness
    }

    pub fn smoothness(&self) -> f32 {
        self.smoothness
    }

    fn current_velocity(&self) -> f32 {
        let window = self.positions.latest_vec(self.config.velocity_window);
        instantaneous_speed(&window)
    }

    fn current_acceleration(&self, timestamp_ms: f64, speed: f32) -> f32 {
        let previous = self.config.acceleration_window - 1;
        let mut window: Vec<(f64, f32)> = self
            .trajectory
            .latest(previous)
            .map(|t| (t.position.timestamp_ms, t.speed))
            .collect();
        window.push((timestamp_ms, speed));
        acceleration(&window)
    }

    fn detect_direction(&self) -> BowDirection {
        let window = self.config.direction_window;
        let skip = self.positions.len().saturating_sub(window);
        let (Some(oldest), Some(newest)) = (self.positions.iter().nth(skip), self.positions.newest())
        else {
            return BowDirection::Stationary;
        };

        let dx = newest.x - oldest.x;
        if self.positions.len() < 2 || dx.abs() < self.config.min_movement {
            return BowDirection::Stationary;
        }

        match (self.config.direction_convention, dx > 0.0) {
            (DirectionConvention::RightwardIsDown, true)
            | (DirectionConvention::RightwardIsUp, false) => BowDirection::Down,
            _ => BowDirection::Up,
        }
    }

    fn change_stroke(&mut self, direction: BowDirection, position: TrackedPosition) {
        if let Some(previous) = self.current_stroke.take() {
            let stroke = previous.finish(
                position.timestamp_ms,
                position.point(),
                self.window_straightness(),
                self.window_smoothness(),
            );
            tracing::debug!(
                direction = ?stroke.direction,
                duration_ms = stroke.duration_ms(),
                average_speed = stroke.average_speed,
                straightness = stroke.straightness,
                smoothness = stroke.smoothness,
                "stroke completed"
            );
            self.strokes.push(stroke);
            self.completed_strokes += 1;
        }

        self.current_stroke = Some(StrokeInProgress::new(
            direction,
            position.timestamp_ms,
            position.point(),
        ));
        self.last_moving_direction = Some(direction);
    }

    /// Calibration first, then arm extension, then distance travelled in the
    /// current stroke against the estimated bow length.
    fn estimate_stick_position(&self, frame: &PoseFrame, hand: Point) -> Option<StickPosition> {
        let ratio = match &self.calibration {
            Some(reference) => Some(reference.fraction_along(hand)),
            None => self
                .arm_extension(frame)
                .or_else(|| self.stroke_travel_fraction(hand)),
        };
        ratio.map(|ratio| StickPosition::from_ratio(ratio, &self.config.stick))
    }

    fn arm_extension(&self, frame: &PoseFrame) -> Option<f32> {
        let side = self.config.bow_side;
        let min = self.config.min_confidence;
        let shoulder = frame.visible(Landmark::shoulder(side), min)?.point();
        let elbow = frame.visible(Landmark::elbow(side), min)?.point();
        let wrist = frame.visible(Landmark::wrist(side), min)?.point();
        arm_extension_ratio(shoulder, elbow, wrist)
    }

    fn stroke_travel_fraction(&self, hand: Point) -> Option<f32> {
        let stroke = self.current_stroke.as_ref()?;
        let travelled =
            (geometry::distance(stroke.start, hand) / self.config.estimated_bow_length).clamp(0.0, 1.0);
        match stroke.direction {
            BowDirection::Down => Some(travelled),
            BowDirection::Up => Some(1.0 - travelled),
            BowDirection::Stationary => None,
        }
    }

    fn window_straightness(&self) -> f32 {
        let window = self.positions.latest_vec(self.config.straightness_window);
        straightness(&window, self.config.max_expected_deviation)
    }

    fn window_smoothness(&self) -> f32 {
        let window = self.trajectory.latest_vec(self.config.smoothness_window);
        smoothness(&window, self.config.max_expected_acceleration_variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f64 = 1000.0 / 30.0;

    fn feed(tracker: &mut MotionTracker, xs: impl IntoIterator<Item = f32>) -> Vec<BowDirection> {
        let start_ms = tracker
            .positions()
            .last()
            .map(|p| p.timestamp_ms + FRAME_MS)
            .unwrap_or(0.0);
        xs.into_iter()
            .enumerate()
            .map(|(i, x)| {
                let frame = PoseFrame::new(start_ms + i as f64 * FRAME_MS, 0.9)
                    .with(Landmark::RightWrist, x, 200.0, 0.9);
                tracker.update(&frame).expect("wrist is visible").direction
            })
            .collect()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TrackerConfig {
            history_capacity: 0,
            ..TrackerConfig::default()
        };
        assert!(MotionTracker::new(config).is_err());
    }

    #[test]
    fn low_confidence_frames_do_not_advance() {
        let mut tracker = MotionTracker::with_defaults();
        let hidden = PoseFrame::new(0.0, 0.9).with(Landmark::RightWrist, 10.0, 10.0, 0.3);

        assert!(tracker.update(&hidden).is_none());
        assert_eq!(tracker.positions().len(), 0);
        assert_eq!(tracker.trajectory().len(), 0);
    }

    #[test]
    fn rightward_motion_is_down_bow_by_default() {
        let mut tracker = MotionTracker::with_defaults();
        let directions = feed(&mut tracker, (0..12).map(|i| 100.0 + i as f32 * 10.0));

        assert_eq!(directions[0], BowDirection::Stationary);
        assert!(directions[1..].iter().all(|d| *d == BowDirection::Down));
    }

    #[test]
    fn convention_flips_direction() {
        let config = TrackerConfig {
            direction_convention: DirectionConvention::RightwardIsUp,
            ..TrackerConfig::default()
        };
        let mut tracker = MotionTracker::new(config).unwrap();
        let directions = feed(&mut tracker, (0..12).map(|i| 100.0 + i as f32 * 10.0));

        assert_eq!(directions.last(), Some(&BowDirection::Up));
    }

    #[test]
    fn jitter_stays_stationary() {
        let mut tracker = MotionTracker::with_defaults();
        let directions = feed(
            &mut tracker,
            (0..100).map(|i| if i % 2 == 0 { 101.0 } else { 99.0 }),
        );

        assert!(directions.iter().all(|d| *d == BowDirection::Stationary));
        assert_eq!(tracker.strokes().len(), 0);
        assert!(tracker.current_stroke().is_none());
    }

    #[test]
    fn reversal_closes_exactly_one_stroke() {
        let mut tracker = MotionTracker::with_defaults();
        feed(&mut tracker, (0..12).map(|i| 100.0 + i as f32 * 10.0));
        feed(&mut tracker, (1..=12).map(|i| 210.0 - i as f32 * 10.0));

        let strokes: Vec<_> = tracker.strokes().collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].direction, BowDirection::Down);
        assert!(strokes[0].average_speed > 0.0);
        assert_eq!(
            tracker.current_stroke().map(|s| s.direction),
            Some(BowDirection::Up)
        );
        assert_eq!(tracker.completed_stroke_count(), 1);
    }

    #[test]
    fn pause_does_not_split_a_stroke() {
        let mut tracker = MotionTracker::with_defaults();
        feed(&mut tracker, (0..12).map(|i| 100.0 + i as f32 * 10.0));
        feed(&mut tracker, std::iter::repeat(210.0).take(20));
        feed(&mut tracker, (1..=12).map(|i| 210.0 + i as f32 * 10.0));

        assert_eq!(tracker.strokes().len(), 0);
        assert_eq!(
            tracker.current_stroke().map(|s| s.direction),
            Some(BowDirection::Down)
        );
    }

    #[test]
    fn stroke_history_is_bounded() {
        let config = TrackerConfig {
            stroke_history_capacity: 3,
            ..TrackerConfig::default()
        };
        let mut tracker = MotionTracker::new(config).unwrap();
        for stroke in 0..8 {
            let step = if stroke % 2 == 0 { 10.0 } else { -10.0 };
            let base = if stroke % 2 == 0 { 100.0 } else { 220.0 };
            feed(&mut tracker, (0..12).map(|i| base + step * i as f32));
        }

        assert_eq!(tracker.strokes().len(), 3);
        assert_eq!(tracker.completed_stroke_count(), 7);
        assert!(tracker.positions().len() <= 30);
    }

    #[test]
    fn stick_position_from_arm_extension() {
        let mut tracker = MotionTracker::with_defaults();
        let frame = PoseFrame::new(0.0, 0.9)
            .with(Landmark::RightShoulder, 0.0, 0.0, 0.9)
            .with(Landmark::RightElbow, 50.0, 0.0, 0.9)
            .with(Landmark::RightWrist, 100.0, 0.0, 0.9);

        let analysis = tracker.update(&frame).unwrap();
        assert_eq!(analysis.stick_position, Some(StickPosition::Tip));
    }

    #[test]
    fn calibration_overrides_arm_extension() {
        let mut tracker = MotionTracker::with_defaults();
        tracker
            .calibrate(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
            .unwrap();
        let frame = PoseFrame::new(0.0, 0.9)
            .with(Landmark::RightShoulder, 0.0, 0.0, 0.9)
            .with(Landmark::RightElbow, 25.0, 0.0, 0.9)
            .with(Landmark::RightWrist, 65.0, 0.0, 0.9);

        let analysis = tracker.update(&frame).unwrap();
        assert_eq!(analysis.stick_position, Some(StickPosition::Middle));
    }

    #[test]
    fn clearing_calibration_falls_back_to_arm_extension() {
        let mut tracker = MotionTracker::with_defaults();
        tracker
            .calibrate(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
            .unwrap();
        tracker.clear_calibration();
        assert!(tracker.calibration().is_none());

        let frame = PoseFrame::new(0.0, 0.9)
            .with(Landmark::RightShoulder, 0.0, 0.0, 0.9)
            .with(Landmark::RightElbow, 25.0, 0.0, 0.9)
            .with(Landmark::RightWrist, 65.0, 0.0, 0.9);

        let analysis = tracker.update(&frame).unwrap();
        assert_eq!(analysis.stick_position, Some(StickPosition::Tip));
    }

    #[test]
    fn non_finite_wrist_is_skipped() {
        let mut tracker = MotionTracker::with_defaults();
        feed(&mut tracker, (0..5).map(|i| 100.0 + i as f32 * 10.0));

        let last_ms = tracker.positions().last().map(|p| p.timestamp_ms).unwrap();
        for x in [f32::NAN, f32::INFINITY] {
            let frame = PoseFrame::new(last_ms + FRAME_MS / 2.0, 0.9)
                .with(Landmark::RightWrist, x, 200.0, 0.9);
            assert!(tracker.update(&frame).is_none());
        }
        assert_eq!(tracker.positions().len(), 5);

        feed(&mut tracker, (5..60).map(|i| 100.0 + i as f32 * 10.0));
        let analysis = tracker.analysis();
        assert!(tracker.positions().all(|p| p.point().is_finite()));
        assert!(analysis.speed.is_finite() && analysis.speed > 0.0);
        assert!((0.0..=100.0).contains(&analysis.smoothness));
        assert!((0.0..=100.0).contains(&analysis.straightness));
        assert_eq!(analysis.direction, BowDirection::Down);
    }

    #[test]
    fn degenerate_calibration_is_rejected() {
        let mut tracker = MotionTracker::with_defaults();
        let err = tracker
            .calibrate(Point::new(5.0, 5.0), Point::new(5.2, 5.0))
            .unwrap_err();

        assert!(matches!(err, BowingError::InvalidCalibration(_)));
        assert!(tracker.calibration().is_none());
    }

    #[test]
    fn travel_estimate_without_arm_keypoints() {
        let mut tracker = MotionTracker::with_defaults();
        feed(&mut tracker, (0..4).map(|i| 100.0 + i as f32 * 10.0));

        assert_eq!(tracker.stick_position(), Some(StickPosition::Frog));
    }

    #[test]
    fn reset_matches_fresh_tracker() {
        let mut tracker = MotionTracker::with_defaults();
        tracker
            .calibrate(Point::new(0.0, 0.0), Point::new(300.0, 0.0))
            .unwrap();
        feed(&mut tracker, (0..12).map(|i| 100.0 + i as f32 * 10.0));
        feed(&mut tracker, (1..=12).map(|i| 210.0 - i as f32 * 10.0));

        tracker.reset();
        let fresh = MotionTracker::with_defaults();

        assert_eq!(tracker.analysis(), fresh.analysis());
        assert_eq!(tracker.positions().len(), 0);
        assert_eq!(tracker.completed_stroke_count(), 0);
        assert!(tracker.calibration().is_none());
        assert!(tracker.current_stroke().is_none());
    }
}
