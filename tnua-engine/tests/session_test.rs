// End-to-end behavior of a session driven by synthetic frames

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use common::{recorded_session, test_config, Published};
use tnua_engine::services::{EmergencyEvent, RepEvent, SkipReason};
use tnua_engine::synthetic::PoseBuilder;
use tnua_engine::{
    EmergencyType, EngineConfig, ExerciseType, FrameError, Landmark, PoseModel, RawLandmark, Session,
};

fn squat_cycles(session: &mut Session, cycles: usize, interval_ms: i64) {
    let mut at = 0;
    for _ in 0..cycles {
        session.process_frame_at(&PoseBuilder::squat(80.0, 70.0).pose(), at);
        at += interval_ms;
        session.process_frame_at(&PoseBuilder::standing().pose(), at);
        at += interval_ms;
    }
}

#[test]
fn test_reps_counted_once_per_cycle_outside_cooldown() {
    let (mut session, _, _) = recorded_session(test_config());
    squat_cycles(&mut session, 2, 1_100);

    let state = session.exercise_state();
    assert_eq!(state.rep_count, 2);
    assert_eq!(state.active_exercise, Some(ExerciseType::Squat));
    assert_eq!(state.last_rep_time, Some(3_300));
}

#[test]
fn test_reps_inside_cooldown_are_not_double_counted() {
    let (mut session, _, _) = recorded_session(test_config());
    let mut events = Vec::new();
    for (i, at) in (0..8).map(|i| (i, i as i64 * 100)) {
        let pose = if i % 2 == 0 {
            PoseBuilder::squat(80.0, 70.0)
        } else {
            PoseBuilder::standing()
        };
        events.extend(session.process_frame_at(&pose.pose(), at).rep_events);
    }

    assert_eq!(session.exercise_state().rep_count, 1);
    let suppressed = events
        .iter()
        .filter(|e| matches!(e, RepEvent::RepSuppressed { .. }))
        .count();
    assert_eq!(suppressed, 3);
}

#[test]
fn test_rep_count_never_decreases() {
    let (mut session, _, _) = recorded_session(test_config());
    let mut last = 0;
    for i in 0..40 {
        let pose = match i % 4 {
            0 => PoseBuilder::squat(85.0, 75.0),
            1 => PoseBuilder::squat(130.0, 120.0),
            2 => PoseBuilder::standing(),
            _ => PoseBuilder::squat(110.0, 100.0),
        };
        let outcome = session.process_frame_at(&pose.pose(), i * 350);
        let count = outcome.exercise.map(|s| s.rep_count).unwrap_or(last);
        assert!(count >= last);
        last = count;
    }
    assert!(last > 0);
}

#[test]
fn test_squat_classification_boundary() {
    let (mut session, _, _) = recorded_session(test_config());
    let inside = session.process_frame_at(&PoseBuilder::squat(99.0, 89.0).pose(), 0);
    assert_eq!(inside.exercise.unwrap().exercise_type, ExerciseType::Squat);

    let (mut session, _, _) = recorded_session(test_config());
    let outside = session.process_frame_at(&PoseBuilder::squat(101.0, 91.0).pose(), 0);
    assert_ne!(outside.exercise.unwrap().exercise_type, ExerciseType::Squat);

    // Knee inside, hip outside
    let (mut session, _, _) = recorded_session(test_config());
    let hip_open = session.process_frame_at(&PoseBuilder::squat(99.0, 91.0).pose(), 0);
    assert_ne!(hip_open.exercise.unwrap().exercise_type, ExerciseType::Squat);
}

#[test]
fn test_emergency_auto_resolves_on_next_frame() {
    let (mut session, _, recorder) = recorded_session(test_config());
    session.process_frame_at(&PoseBuilder::lying().pose(), 0);
    assert!(session.emergency_state().is_active);
    assert_eq!(session.emergency_state().emergency_type, EmergencyType::Fall);

    for at in [1_000, 3_000, 5_000] {
        let outcome = session.process_frame_at(&PoseBuilder::standing().pose(), at);
        assert!(outcome.emergency_events.is_empty());
    }
    let outcome = session.process_frame_at(&PoseBuilder::standing().pose(), 5_001);
    assert_matches!(
        outcome.emergency_events.as_slice(),
        [EmergencyEvent::Resolved { previous }] if previous.emergency_type == EmergencyType::Fall
    );
    assert!(!session.emergency_state().is_active);

    let emergencies = recorder.emergencies();
    assert_eq!(emergencies.len(), 2);
    assert_matches!(&emergencies[0], Published::EmergencyDetected(s) if s.emergency_type == EmergencyType::Fall);
    assert_matches!(&emergencies[1], Published::EmergencyResolved(_));
}

#[test]
fn test_emergency_auto_resolves_on_timer_check() {
    let (mut session, clock, recorder) = recorded_session(test_config());
    session.process_frame(&PoseBuilder::lying().pose());

    clock.advance(5_000);
    assert_eq!(session.check_timers(), None);
    clock.advance(1);
    assert_matches!(session.check_timers(), Some(EmergencyEvent::Resolved { .. }));
    assert_matches!(recorder.emergencies().last(), Some(Published::EmergencyResolved(_)));
}

#[test]
fn test_persistent_fall_escalates_to_stuck() {
    let (mut session, _, recorder) = recorded_session(test_config());
    for at in (0..=12_000).step_by(500) {
        session.process_frame_at(&PoseBuilder::lying().pose(), at);
    }
    let kinds: Vec<_> = recorder
        .emergencies()
        .into_iter()
        .filter_map(|e| match e {
            Published::EmergencyDetected(s) => Some(s.emergency_type),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![EmergencyType::Fall, EmergencyType::Stuck]);
    assert_eq!(session.emergency_state().onset_time, Some(0));
}

#[test]
fn test_low_confidence_frame_changes_nothing() {
    let (mut session, _, recorder) = recorded_session(test_config());
    squat_cycles(&mut session, 1, 1_100);
    session.process_frame_at(&PoseBuilder::squat(80.0, 70.0).pose(), 2_200);
    session.process_frame_at(&PoseBuilder::lying().pose(), 2_300);

    let exercise_before = session.exercise_state().clone();
    let emergency_before = session.emergency_state();
    recorder.clear();

    let outcome = session.process_frame_at(&PoseBuilder::standing().keypoint_score(0.1).pose(), 2_400);

    assert_eq!(outcome.error, None);
    assert_eq!(session.exercise_state().rep_count, exercise_before.rep_count);
    assert_eq!(session.exercise_state().form_score, exercise_before.form_score);
    assert_eq!(session.emergency_state(), emergency_before);
    assert_eq!(
        recorder.events(),
        vec![Published::Skipped(SkipReason::MissingKeypoints {
            exercise: ExerciseType::Squat
        })]
    );
}

#[test]
fn test_low_pose_score_frame_is_skipped() {
    let (mut session, _, recorder) = recorded_session(test_config());
    let outcome = session.process_frame_at(&PoseBuilder::lying().score(0.5).pose(), 0);

    assert_matches!(outcome.skipped, Some(SkipReason::LowPoseScore { .. }));
    assert!(outcome.emergency_events.is_empty());
    assert_eq!(recorder.events().len(), 1);
}

#[test]
fn test_every_frame_gets_a_callback() {
    let (mut session, _, recorder) = recorded_session(test_config());
    let frames = [
        PoseBuilder::standing().pose(),
        PoseBuilder::standing().keypoint_score(0.0).pose(),
        PoseBuilder::squat(80.0, 70.0).score(0.1).pose(),
        PoseBuilder::squat(80.0, 70.0).without(Landmark::LeftKnee).pose(),
    ];
    for (i, frame) in frames.iter().enumerate() {
        recorder.clear();
        session.process_frame_at(frame, i as i64 * 100);
        assert!(!recorder.events().is_empty(), "frame {i} produced no callback");
    }

    recorder.clear();
    let mut bad = PoseBuilder::standing().pose();
    bad.score = f32::NAN;
    session.process_frame_at(&bad, 1_000);
    assert_matches!(
        recorder.events().as_slice(),
        [Published::Error(FrameError::PoseScoreOutOfRange(_))]
    );
}

#[test]
fn test_multiple_subscribers_each_notified() {
    let (mut session, _, first) = recorded_session(test_config());
    let second = common::Recorder::default();
    session.subscribe(second.handlers());

    session.process_frame_at(&PoseBuilder::lying().pose(), 0);
    assert_eq!(first.emergencies(), second.emergencies());
    assert_eq!(first.emergencies().len(), 1);
}

#[test]
fn test_summary_totals() {
    let (mut session, _, _) = recorded_session(test_config());
    squat_cycles(&mut session, 2, 1_100);
    session.process_frame_at(&PoseBuilder::standing().score(0.2).pose(), 4_500);
    session.process_frame_at(&PoseBuilder::lying().pose(), 5_000);
    session.process_frame_at(&PoseBuilder::lying().pose(), 4_000);

    let summary = session.summary();
    assert_eq!(summary.session_id, session.id());
    assert_eq!(summary.frames_processed, 6);
    assert_eq!(summary.frames_skipped, 1);
    assert_eq!(summary.frames_errored, 1);
    assert_eq!(summary.rep_count, 2);
    assert_eq!(summary.exercise_frames.get(&ExerciseType::Squat), Some(&2));
    assert_eq!(summary.exercise_frames.get(&ExerciseType::Unknown), Some(&3));
    assert_eq!(summary.emergencies_raised, 1);
    assert_eq!(summary.duration_ms, 5_000);
}

fn movenet_landmarks(builder: PoseBuilder) -> Vec<RawLandmark> {
    let full = builder.skeleton();
    PoseModel::MoveNet
        .landmarks()
        .iter()
        .map(|l| {
            let kp = full.get(*l).unwrap();
            RawLandmark {
                x: kp.x,
                y: kp.y,
                z: None,
                visibility: kp.score,
            }
        })
        .collect()
}

#[test]
fn test_movenet_frames_through_session() {
    let mut config = test_config();
    config.pose_model = PoseModel::MoveNet;
    let (mut session, _, _) = recorded_session(config);

    let raw = movenet_landmarks(PoseBuilder::squat(80.0, 70.0));
    let outcome = session.process_indexed_frame_at(0.9, &raw, 0);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.exercise.unwrap().exercise_type, ExerciseType::Squat);

    // Same landmarks under the default model are the wrong shape
    let (mut session, _, _) = recorded_session(test_config());
    let outcome = session.process_indexed_frame_at(0.9, &raw, 0);
    assert_matches!(
        outcome.error,
        Some(FrameError::LandmarkCountMismatch {
            model: PoseModel::BlazePose,
            expected: 33,
            actual: 17,
        })
    );
}

#[test]
fn test_indexed_frame_with_wrong_count_is_a_frame_error() {
    let mut config = test_config();
    config.pose_model = PoseModel::MoveNet;
    let (mut session, clock, recorder) = recorded_session(config);

    let mut raw = movenet_landmarks(PoseBuilder::standing());
    raw.truncate(12);
    clock.set(250);
    let outcome = session.process_indexed_frame(0.9, &raw);

    let expected = FrameError::LandmarkCountMismatch {
        model: PoseModel::MoveNet,
        expected: 17,
        actual: 12,
    };
    assert_eq!(outcome.timestamp_ms, 250);
    assert_eq!(outcome.error, Some(expected.clone()));
    assert_eq!(recorder.events(), vec![Published::Error(expected)]);

    let summary = session.summary();
    assert_eq!(summary.frames_errored, 1);
    assert_eq!(summary.frames_processed, 0);

    let outcome = session.process_indexed_frame(0.9, &movenet_landmarks(PoseBuilder::standing()));
    assert_eq!(outcome.error, None);
    assert_eq!(session.summary().frames_processed, 1);
}

#[test]
fn test_frames_before_a_timer_check_are_rejected() {
    let (mut session, _, recorder) = recorded_session(test_config());
    session.process_frame_at(&PoseBuilder::lying().pose(), 0);
    assert_matches!(session.check_timers_at(10_000), Some(EmergencyEvent::Resolved { .. }));
    recorder.clear();

    let outcome = session.process_frame_at(&PoseBuilder::lying().pose(), 6_000);
    assert_eq!(
        outcome.error,
        Some(FrameError::OutOfOrder {
            previous: 10_000,
            current: 6_000
        })
    );
    assert!(outcome.emergency_events.is_empty());
    assert!(recorder.emergencies().is_empty());
    assert!(!session.emergency_state().is_active);

    // A timer check from the past changes nothing
    session.process_frame_at(&PoseBuilder::lying().pose(), 12_000);
    assert_eq!(session.check_timers_at(11_000), None);
    assert!(session.emergency_state().is_active);
    assert_eq!(session.summary().emergencies_raised, 2);
}

#[test]
fn test_extreme_timestamps_are_handled() {
    let (mut session, _, recorder) = recorded_session(test_config());
    session.process_frame_at(&PoseBuilder::lying().pose(), i64::MIN);
    let outcome = session.process_frame_at(&PoseBuilder::lying().pose(), 0);
    assert_matches!(
        outcome.emergency_events.as_slice(),
        [EmergencyEvent::Detected(s)] if s.emergency_type == EmergencyType::Stuck
    );
    assert_eq!(session.summary().duration_ms, i64::MAX);
    assert_eq!(recorder.emergencies().len(), 2);

    let (mut session, _, _) = recorded_session(test_config());
    for at in [i64::MIN, i64::MAX] {
        session.process_frame_at(&PoseBuilder::squat(80.0, 70.0).pose(), at);
        session.process_frame_at(&PoseBuilder::standing().pose(), at);
    }
    assert_eq!(session.exercise_state().rep_count, 2);
    assert_eq!(session.exercise_state().last_rep_time, Some(i64::MAX));
}

#[test]
fn test_squat_cycles_with_default_smoothing() {
    let mut config = EngineConfig::default();
    config.emergency.fall_threshold = 0.8;
    config.emergency.collapse_threshold = 0.7;
    let (mut session, _, recorder) = recorded_session(config);

    let mut at = 0;
    let mut hold = |session: &mut Session, builder: PoseBuilder, duration_ms: i64| {
        let pose = builder.pose();
        let end = at + duration_ms;
        while at < end {
            session.process_frame_at(&pose, at);
            at += 33;
        }
    };

    hold(&mut session, PoseBuilder::standing(), 1_000);
    for _ in 0..3 {
        hold(&mut session, PoseBuilder::squat(80.0, 70.0), 700);
        hold(&mut session, PoseBuilder::standing(), 700);
    }
    assert_eq!(session.exercise_state().rep_count, 3);
    assert_eq!(session.exercise_state().active_exercise, Some(ExerciseType::Squat));
    assert!(recorder.emergencies().is_empty());

    hold(&mut session, PoseBuilder::lying(), 2_000);
    assert!(session.emergency_state().is_active);
    hold(&mut session, PoseBuilder::standing(), 6_000);
    assert!(!session.emergency_state().is_active);

    let emergencies = recorder.emergencies();
    assert!(emergencies
        .iter()
        .any(|e| matches!(e, Published::EmergencyDetected(s) if s.emergency_type == EmergencyType::Fall)));
    assert_matches!(emergencies.last(), Some(Published::EmergencyResolved(_)));
    assert_eq!(session.exercise_state().rep_count, 3);
}

#[test]
fn test_default_thresholds_flag_upright_body() {
    // With the stock thresholds fall is checked first at 0.3, so any body
    // whose torso sits in the lower two thirds of the frame reads as a fall
    let mut session = Session::new(EngineConfig::default()).unwrap();
    let outcome = session.process_frame_at(&PoseBuilder::standing().pose(), 0);
    assert_matches!(
        outcome.emergency_events.as_slice(),
        [EmergencyEvent::Detected(s)] if s.emergency_type == EmergencyType::Fall
    );
}
