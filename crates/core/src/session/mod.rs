//! Per-subject practice session: posture and bowing analysis for every frame
//! plus running totals for an end-of-session summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::Point,
    motion::MotionTracker,
    posture::{PostureFault, PostureReport},
    report::BowingAnalysis,
    AppConfig, PoseFrame, PostureConfig, Result,
};

/// Everything derived from a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub timestamp_ms: f64,
    pub posture: PostureReport,
    /// `None` when the bow hand was not tracked in this frame.
    pub bowing: Option<BowingAnalysis>,
}

/// Totals accumulated since the session started or was last reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub tracked_frames: u64,
    /// Share of frames in which the bow hand was tracked, 0-1.
    pub tracking_ratio: f32,
    pub completed_strokes: u64,
    pub average_stroke_speed: Option<f32>,
    pub average_straightness: Option<f32>,
    pub average_smoothness: Option<f32>,
    /// Posture faults by number of frames they were seen in, most frequent
    /// first.
    pub posture_faults: Vec<(PostureFault, u64)>,
}

#[derive(Debug, Default)]
struct Totals {
    frames: u64,
    tracked_frames: u64,
    strokes_seen: u64,
    speed_sum: f64,
    straightness_sum: f64,
    smoothness_sum: f64,
    faults: BTreeMap<PostureFault, u64>,
}

pub struct PracticeSession {
    posture: PostureConfig,
    tracker: MotionTracker,
    totals: Totals,
}

impl PracticeSession {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracker: MotionTracker::new(config.tracker)?,
            posture: config.posture,
            totals: Totals::default(),
        })
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    pub fn calibrate(&mut self, frog: Point, tip: Point) -> Result<()> {
        self.tracker.calibrate(frog, tip)
    }

    pub fn process(&mut self, frame: &PoseFrame) -> FrameReport {
        let posture = PostureReport::analyze(frame, &self.posture);
        let bowing = self.tracker.update(frame);

        self.totals.frames += 1;
        for fault in posture.faults() {
            *self.totals.faults.entry(fault).or_insert(0) += 1;
        }
        if bowing.is_some() {
            self.totals.tracked_frames += 1;
        }
        self.absorb_new_strokes();

        FrameReport {
            timestamp_ms: frame.timestamp_ms,
            posture,
            bowing,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let totals = &self.totals;
        let strokes = totals.strokes_seen;
        let average = |sum: f64| (strokes > 0).then(|| (sum / strokes as f64) as f32);

        let mut posture_faults: Vec<(PostureFault, u64)> =
            totals.faults.iter().map(|(f, n)| (*f, *n)).collect();
        posture_faults.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let summary = SessionSummary {
            frames: totals.frames,
            tracked_frames: totals.tracked_frames,
            tracking_ratio: if totals.frames == 0 {
                0.0
            } else {
                totals.tracked_frames as f32 / totals.frames as f32
            },
            completed_strokes: self.tracker.completed_stroke_count(),
            average_stroke_speed: average(totals.speed_sum),
            average_straightness: average(totals.straightness_sum),
            average_smoothness: average(totals.smoothness_sum),
            posture_faults,
        };

        tracing::info!(
            frames = summary.frames,
            tracked_frames = summary.tracked_frames,
            completed_strokes = summary.completed_strokes,
            "practice session summary"
        );
        summary
    }

    /// Drops all history and totals; configuration is kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.totals = Totals::default();
    }

    /// Folds strokes completed since the last frame into the totals. The
    /// tracker's history is bounded, so the lifetime counter decides how many
    /// of the newest entries are new.
    fn absorb_new_strokes(&mut self) {
        let completed = self.tracker.completed_stroke_count();
        let new = completed.saturating_sub(self.totals.strokes_seen) as usize;
        if new == 0 {
            return;
        }

        let available = self.tracker.strokes().len();
        for stroke in self.tracker.strokes().skip(available.saturating_sub(new)) {
            self.totals.speed_sum += f64::from(stroke.average_speed);
            self.totals.straightness_sum += f64::from(stroke.straightness);
            self.totals.smoothness_sum += f64::from(stroke.smoothness);
        }
        self.totals.strokes_seen = completed;
    }
}
