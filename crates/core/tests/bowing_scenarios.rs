//! End-to-end bowing scenarios driven through the public API.

use bowing_coach_core::{
    AppConfig, BowDirection, Landmark, MotionTracker, PoseFrame, PoseSource, PracticeSession,
    ReplaySource, TrackerConfig,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Normal;

const FRAME_MS: f64 = 33.3;

fn wrist_frame(i: usize, x: f32, y: f32) -> PoseFrame {
    PoseFrame::new(i as f64 * FRAME_MS, 0.9).with(Landmark::RightWrist, x, y, 0.9)
}

/// Fifteen frames rightward then fifteen leftward at 6 px/frame, with
/// Gaussian detector noise on both axes.
fn noisy_down_up(seed: u64) -> Vec<PoseFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0_f32, 2.0).unwrap();

    let path = (0..15)
        .map(|i| 100.0 + 6.0 * i as f32)
        .chain((1..=15).map(|i| 184.0 - 6.0 * i as f32));

    path.enumerate()
        .map(|(i, x)| wrist_frame(i, x + rng.sample(noise), 240.0 + rng.sample(noise)))
        .collect()
}

#[test]
fn noisy_down_up_yields_one_smooth_down_stroke() {
    for seed in 0..20 {
        let mut tracker = MotionTracker::with_defaults();
        for frame in noisy_down_up(seed) {
            tracker.update(&frame).expect("wrist is visible");
        }

        let strokes: Vec<_> = tracker.strokes().collect();
        assert!(!strokes.is_empty(), "seed {seed}: no stroke completed");
        assert_eq!(strokes[0].direction, BowDirection::Down, "seed {seed}");
        assert!(
            strokes.iter().all(|s| s.smoothness > 70.0),
            "seed {seed}: {strokes:?}"
        );
        assert_eq!(
            tracker.current_stroke().map(|s| s.direction),
            Some(BowDirection::Up),
            "seed {seed}"
        );
    }
}

#[test]
fn straightness_drops_as_wobble_grows() {
    const PATTERN: [f32; 8] = [0.0, 3.0, -2.0, 4.0, -3.0, 1.0, -4.0, 2.0];

    let score = |amplitude: f32| {
        let mut tracker = MotionTracker::with_defaults();
        for i in 0..20 {
            let y = 200.0 + amplitude * PATTERN[i % PATTERN.len()];
            tracker.update(&wrist_frame(i, 100.0 + 10.0 * i as f32, y));
        }
        tracker.straightness()
    };

    let (flat, small, medium, large) = (score(0.0), score(1.0), score(2.0), score(4.0));
    assert!((flat - 100.0).abs() < 1e-3, "{flat}");
    assert!(small < flat, "{small} vs {flat}");
    assert!(medium < small, "{medium} vs {small}");
    assert!(large < medium, "{large} vs {medium}");
    assert!(large > 0.0);
}

#[test]
fn reset_tracker_replays_like_a_fresh_one() {
    let frames = noisy_down_up(7);

    let mut reused = MotionTracker::new(TrackerConfig::default()).unwrap();
    for frame in &frames {
        reused.update(frame);
    }
    reused.reset();
    reused.reset();

    let mut fresh = MotionTracker::with_defaults();
    for frame in &frames {
        assert_eq!(reused.update(frame), fresh.update(frame));
    }
    assert_eq!(reused.completed_stroke_count(), fresh.completed_stroke_count());
}

#[test]
fn untracked_frames_leave_the_session_consistent() {
    let mut session = PracticeSession::new(AppConfig::default()).unwrap();
    for (i, frame) in noisy_down_up(3).into_iter().enumerate() {
        // every fourth detection is lost
        let frame = if i % 4 == 3 {
            PoseFrame::new(frame.timestamp_ms, 0.2)
        } else {
            frame
        };
        let report = session.process(&frame);
        assert_eq!(report.timestamp_ms, i as f64 * FRAME_MS);
    }

    let summary = session.summary();
    assert_eq!(summary.frames, 30);
    assert_eq!(summary.tracked_frames, 23);
    assert!((summary.tracking_ratio - 23.0 / 30.0).abs() < 1e-6);
}

#[test]
fn left_handed_config_tracks_left_wrist() {
    let config = AppConfig::default().with_bow_side(bowing_coach_core::Side::Left);
    let mut session = PracticeSession::new(config).unwrap();

    let right_only = wrist_frame(0, 100.0, 100.0);
    assert!(session.process(&right_only).bowing.is_none());

    let left = PoseFrame::new(FRAME_MS, 0.9).with(Landmark::LeftWrist, 100.0, 100.0, 0.9);
    assert!(session.process(&left).bowing.is_some());
}

#[test]
fn replayed_stream_matches_direct_processing() {
    let frames = noisy_down_up(5);
    let mut source = ReplaySource::new(frames.clone());

    let mut replayed = PracticeSession::new(AppConfig::default()).unwrap();
    let mut replayed_reports = Vec::new();
    while let Some(frame) = source.next_frame().unwrap() {
        replayed_reports.push(replayed.process(&frame));
    }

    let mut direct = PracticeSession::new(AppConfig::default()).unwrap();
    let direct_reports: Vec<_> = frames.iter().map(|f| direct.process(f)).collect();

    assert_eq!(source.remaining(), 0);
    assert_eq!(replayed_reports, direct_reports);
    assert_eq!(replayed.summary(), direct.summary());
}
