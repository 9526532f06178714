// Shared helpers for engine integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use tnua_engine::services::SkipReason;
use tnua_engine::{
    EmergencyState, EngineConfig, ExerciseState, FrameError, ManualClock, Session, SessionHandlers,
};

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .init();
    });
}

/// Default config with smoothing off and emergency thresholds above a
/// standing or squatting body, so only lying down raises a fall
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.smoothing.alpha = 0.0;
    config.emergency.fall_threshold = 0.8;
    config.emergency.collapse_threshold = 0.7;
    config
}

/// Everything the session published, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Exercise(ExerciseState),
    EmergencyDetected(EmergencyState),
    EmergencyResolved(EmergencyState),
    Error(FrameError),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Published>>>,
}

impl Recorder {
    pub fn handlers(&self) -> SessionHandlers {
        let exercise = self.events.clone();
        let detected = self.events.clone();
        let resolved = self.events.clone();
        let errors = self.events.clone();
        let skipped = self.events.clone();
        SessionHandlers::new()
            .on_exercise_detected(move |s| exercise.lock().unwrap().push(Published::Exercise(s.clone())))
            .on_emergency_detected(move |s| {
                detected.lock().unwrap().push(Published::EmergencyDetected(s.clone()))
            })
            .on_emergency_resolved(move |s| {
                resolved.lock().unwrap().push(Published::EmergencyResolved(s.clone()))
            })
            .on_error(move |e| errors.lock().unwrap().push(Published::Error(e.clone())))
            .on_frame_skipped(move |r| skipped.lock().unwrap().push(Published::Skipped(*r)))
    }

    pub fn events(&self) -> Vec<Published> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn emergencies(&self) -> Vec<Published> {
        self.events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Published::EmergencyDetected(_) | Published::EmergencyResolved(_)
                )
            })
            .collect()
    }
}

/// Session on a manual clock with a recorder subscribed
pub fn recorded_session(config: EngineConfig) -> (Session, ManualClock, Recorder) {
    init_test_logging();
    let clock = ManualClock::new(0);
    let mut session = Session::with_clock(config, clock.clone()).expect("valid config");
    let recorder = Recorder::default();
    session.subscribe(recorder.handlers());
    (session, clock, recorder)
}
