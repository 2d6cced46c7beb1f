//! External-facing bowing snapshot derived from [`MotionTracker`] state.

use serde::{Deserialize, Serialize};

use crate::{
    motion::{BowDirection, MotionTracker, Stroke},
    posture::StickPosition,
    TrackerConfig,
};

/// Rule that produced a suggestion. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Straightness,
    BowChange,
    Speed,
    StickPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
}

impl Suggestion {
    fn new(kind: SuggestionKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// Bowing state for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowingAnalysis {
    /// Direction over the most recent window; may be stationary mid-stroke.
    pub direction: BowDirection,
    /// Direction of the stroke in progress, if one has started.
    pub stroke_direction: Option<BowDirection>,
    pub stick_position: Option<StickPosition>,
    /// px/s
    pub speed: f32,
    /// 0-100 over the straightness window.
    pub straightness: f32,
    /// 0-100 over the smoothness window.
    pub smoothness: f32,
    /// `false` once the two latest bow changes were both rough.
    pub bow_change_smooth: bool,
    /// Latest completed strokes, oldest first.
    pub recent_strokes: Vec<Stroke>,
    pub average_speed: Option<f32>,
    pub average_straightness: Option<f32>,
    pub suggestions: Vec<Suggestion>,
}

impl BowingAnalysis {
    pub fn from_tracker(tracker: &MotionTracker) -> Self {
        let config = tracker.config();

        let skip = tracker.strokes().len().saturating_sub(config.recent_stroke_count);
        let recent_strokes: Vec<Stroke> = tracker.strokes().skip(skip).cloned().collect();

        let bow_change_smooth = is_bow_change_smooth(
            tracker.strokes(),
            config.bow_change_smoothness_threshold,
        );

        let average_speed = mean(recent_strokes.iter().map(|s| s.average_speed));
        let average_straightness = mean(recent_strokes.iter().map(|s| s.straightness));

        let mut analysis = Self {
            direction: tracker.direction(),
            stroke_direction: tracker.current_stroke().map(|s| s.direction),
            stick_position: tracker.stick_position(),
            speed: tracker.speed(),
            straightness: tracker.straightness(),
            smoothness: tracker.smoothness(),
            bow_change_smooth,
            recent_strokes,
            average_speed,
            average_straightness,
            suggestions: Vec::new(),
        };
        analysis.suggestions = suggestions(&analysis, config);
        analysis
    }
}

/// Rough only when each of the two most recent strokes is at or below
/// `threshold`.
fn is_bow_change_smooth<'a>(
    strokes: impl DoubleEndedIterator<Item = &'a Stroke>,
    threshold: f32,
) -> bool {
    let latest: Vec<&Stroke> = strokes.rev().take(2).collect();
    !(latest.len() == 2 && latest.iter().all(|s| s.smoothness <= threshold))
}

/// Fixed-threshold rules in priority order; each contributes at most one
/// suggestion.
fn suggestions(analysis: &BowingAnalysis, config: &TrackerConfig) -> Vec<Suggestion> {
    let limits = &config.suggestions;
    let mut out = Vec::new();

    if analysis.straightness < limits.min_straightness {
        out.push(Suggestion::new(
            SuggestionKind::Straightness,
            "Keep the bow parallel to the bridge; the stroke is drifting.",
        ));
    }

    if !analysis.bow_change_smooth {
        out.push(Suggestion::new(
            SuggestionKind::BowChange,
            "Smooth out bow changes by letting the fingers flex at the frog and tip.",
        ));
    }

    match analysis.average_speed {
        Some(speed) if speed > limits.max_speed => out.push(Suggestion::new(
            SuggestionKind::Speed,
            "Slow the bow down to keep the sound from thinning out.",
        )),
        Some(speed) if speed < limits.min_speed => out.push(Suggestion::new(
            SuggestionKind::Speed,
            "Use more bow; the strokes are very slow.",
        )),
        _ => {}
    }

    match analysis.stick_position {
        Some(StickPosition::Frog) if analysis.direction.is_moving() => out.push(Suggestion::new(
            SuggestionKind::StickPosition,
            "Lighten the arm weight near the frog to avoid crunching.",
        )),
        Some(StickPosition::Tip) if analysis.direction.is_moving() => out.push(Suggestion::new(
            SuggestionKind::StickPosition,
            "Add index-finger weight near the tip to keep the tone full.",
        )),
        _ => {}
    }

    out.truncate(config.max_suggestions);
    out
}

fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(sum, count), v| {
        (sum + f64::from(v), count + 1)
    });
    (count > 0).then(|| (sum / count as f64) as f32)
}
