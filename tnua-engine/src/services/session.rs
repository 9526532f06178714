//! Session orchestration
//!
//! A `Session` owns one workout's smoothing history, exercise state and
//! emergency state. Frames go through smoothing, then independently through
//! the exercise path and the emergency path; results are published to every
//! subscriber. Per-frame failures are reported, never propagated: every frame
//! produces at least one callback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{ConfigError, FrameError};
use crate::models::emergency::EmergencyState;
use crate::models::exercise::{ExerciseState, ExerciseType};
use crate::models::keypoint::{Pose, PoseModel, RawLandmark, Skeleton};
use crate::services::emergency_detection_service::{EmergencyDetector, EmergencyEvent};
use crate::services::exercise_tracker::{ExerciseTracker, ExerciseUpdate, SkipReason};
use crate::services::keypoint_processor::PoseSmoother;
use crate::services::rep_counter::RepEvent;

type Handler<T> = Box<dyn FnMut(&T) + Send>;

/// Callbacks for one subscriber; unset callbacks are ignored
#[derive(Default)]
pub struct SessionHandlers {
    on_exercise_detected: Option<Handler<ExerciseState>>,
    on_emergency_detected: Option<Handler<EmergencyState>>,
    on_emergency_resolved: Option<Handler<EmergencyState>>,
    on_error: Option<Handler<FrameError>>,
    on_frame_skipped: Option<Handler<SkipReason>>,
}

impl SessionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exercise state after every analysed frame
    pub fn on_exercise_detected(mut self, f: impl FnMut(&ExerciseState) + Send + 'static) -> Self {
        self.on_exercise_detected = Some(Box::new(f));
        self
    }

    /// New emergency, change of kind, or stuck re-fire
    pub fn on_emergency_detected(
        mut self,
        f: impl FnMut(&EmergencyState) + Send + 'static,
    ) -> Self {
        self.on_emergency_detected = Some(Box::new(f));
        self
    }

    /// Emergency ended; receives the last active state
    pub fn on_emergency_resolved(
        mut self,
        f: impl FnMut(&EmergencyState) + Send + 'static,
    ) -> Self {
        self.on_emergency_resolved = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&FrameError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Frame too uncertain to update exercise state
    pub fn on_frame_skipped(mut self, f: impl FnMut(&SkipReason) + Send + 'static) -> Self {
        self.on_frame_skipped = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for SessionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandlers")
            .field("on_exercise_detected", &self.on_exercise_detected.is_some())
            .field("on_emergency_detected", &self.on_emergency_detected.is_some())
            .field("on_emergency_resolved", &self.on_emergency_resolved.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_frame_skipped", &self.on_frame_skipped.is_some())
            .finish()
    }
}

/// Handle returned by [`Session::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

/// Everything one frame produced, for callers that poll instead of subscribe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameOutcome {
    pub timestamp_ms: i64,
    pub exercise: Option<ExerciseState>,
    pub rep_events: Vec<RepEvent>,
    pub emergency_events: Vec<EmergencyEvent>,
    pub skipped: Option<SkipReason>,
    pub error: Option<FrameError>,
}

/// Session totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub frames_errored: u64,
    pub rep_count: u32,
    /// Frames per classified exercise, `unknown` included
    pub exercise_frames: BTreeMap<ExerciseType, u64>,
    pub emergencies_raised: u64,
    /// First to last accepted frame
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Default)]
struct SessionStats {
    frames_processed: u64,
    frames_skipped: u64,
    frames_errored: u64,
    exercise_frames: BTreeMap<ExerciseType, u64>,
    emergencies_raised: u64,
    first_frame: Option<i64>,
    last_frame: Option<i64>,
    /// Latest time seen from a frame or a timer check; nothing earlier is accepted
    floor: Option<i64>,
}

/// One workout's analysis pipeline
pub struct Session {
    id: Uuid,
    clock: Box<dyn Clock>,
    pose_model: PoseModel,
    smoother: PoseSmoother,
    exercise: ExerciseTracker,
    emergency: EmergencyDetector,
    subscribers: Vec<(SubscriptionId, SessionHandlers)>,
    stats: SessionStats,
}

impl Session {
    /// Create a session on the wall clock
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }

    /// Create a session reading time from `clock`
    pub fn with_clock(config: EngineConfig, clock: impl Clock + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, pose_model = %config.pose_model, "Session started");

        Ok(Self {
            id,
            clock: Box::new(clock),
            pose_model: config.pose_model,
            smoother: PoseSmoother::new(&config.smoothing),
            exercise: ExerciseTracker::new(&config),
            emergency: EmergencyDetector::new(&config.emergency),
            subscribers: Vec::new(),
            stats: SessionStats::default(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register callbacks; any number of subscribers may coexist
    pub fn subscribe(&mut self, handlers: SessionHandlers) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.push((id, handlers));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Process a frame stamped with the session clock
    pub fn process_frame(&mut self, pose: &Pose) -> FrameOutcome {
        let now = self.clock.now_ms();
        self.process_frame_at(pose, now)
    }

    /// Process a frame observed at `now` (ms). Frames must arrive in
    /// timestamp order; an earlier timestamp is reported as an error.
    pub fn process_frame_at(&mut self, pose: &Pose, now: i64) -> FrameOutcome {
        let span = tracing::debug_span!("frame", session_id = %self.id, at = now);
        let _enter = span.enter();

        let skeleton = match self.accept(pose, now) {
            Ok(skeleton) => skeleton,
            Err(err) => return self.reject(err, now),
        };

        let mut outcome = FrameOutcome {
            timestamp_ms: now,
            ..FrameOutcome::default()
        };

        self.stats.frames_processed += 1;
        self.stats.first_frame.get_or_insert(now);
        self.stats.last_frame = Some(now);
        self.stats.floor = Some(now);

        let smoothed = self.smoother.process(&skeleton);

        match self.exercise.process(&smoothed, now) {
            ExerciseUpdate::Updated {
                state,
                classification,
                events,
            } => {
                *self
                    .stats
                    .exercise_frames
                    .entry(classification.exercise)
                    .or_default() += 1;
                self.notify_exercise(&state);
                outcome.exercise = Some(state);
                outcome.rep_events = events;
            }
            ExerciseUpdate::Skipped(reason) => {
                tracing::debug!(?reason, "Frame skipped for exercise tracking");
                self.stats.frames_skipped += 1;
                self.notify_skipped(&reason);
                outcome.skipped = Some(reason);
            }
        }

        if let Some(event) = self.emergency.process(&smoothed, now) {
            self.publish_emergency(&event);
            outcome.emergency_events.push(event);
        }

        outcome
    }

    /// Process the index-ordered landmarks of the configured pose model,
    /// stamped with the session clock
    pub fn process_indexed_frame(&mut self, score: f32, landmarks: &[RawLandmark]) -> FrameOutcome {
        let now = self.clock.now_ms();
        self.process_indexed_frame_at(score, landmarks, now)
    }

    /// Like [`Session::process_frame_at`], for raw estimator output. A
    /// landmark count that does not match the pose model is a frame error.
    pub fn process_indexed_frame_at(
        &mut self,
        score: f32,
        landmarks: &[RawLandmark],
        now: i64,
    ) -> FrameOutcome {
        match Pose::from_indexed(self.pose_model, score, landmarks) {
            Ok(pose) => self.process_frame_at(&pose, now),
            Err(err) => {
                let span = tracing::debug_span!("frame", session_id = %self.id, at = now);
                let _enter = span.enter();
                self.reject(err, now)
            }
        }
    }

    fn reject(&mut self, err: FrameError, now: i64) -> FrameOutcome {
        tracing::error!(error = %err, "Frame rejected");
        self.stats.frames_errored += 1;
        self.notify_error(&err);
        FrameOutcome {
            timestamp_ms: now,
            error: Some(err),
            ..FrameOutcome::default()
        }
    }

    fn accept(&self, pose: &Pose, now: i64) -> Result<Skeleton, FrameError> {
        if let Some(previous) = self.stats.floor {
            if now < previous {
                return Err(FrameError::OutOfOrder {
                    previous,
                    current: now,
                });
            }
        }
        Skeleton::try_from(pose)
    }

    /// Advance emergency timers on the session clock without a frame
    pub fn check_timers(&mut self) -> Option<EmergencyEvent> {
        let now = self.clock.now_ms();
        self.check_timers_at(now)
    }

    /// Resolve or re-fire emergencies as of `now`, for hosts that lost the
    /// subject and have no frames to send. A `now` earlier than the latest
    /// frame or timer check is ignored; later frames must not precede it.
    pub fn check_timers_at(&mut self, now: i64) -> Option<EmergencyEvent> {
        if let Some(previous) = self.stats.floor {
            if now < previous {
                tracing::warn!(session_id = %self.id, previous, now, "Ignoring timer check from the past");
                return None;
            }
        }
        self.stats.floor = Some(now);

        let event = self.emergency.tick(now)?;
        self.publish_emergency(&event);
        Some(event)
    }

    /// Fresh workout. Exercise and emergency state are cleared; smoothing
    /// history is kept.
    pub fn reset(&mut self) {
        tracing::info!(session_id = %self.id, "Session reset");
        self.exercise.reset();
        self.emergency.reset();
    }

    /// User dismissed the emergency alert
    pub fn dismiss_emergency(&mut self) {
        if let Some(event) = self.emergency.dismiss() {
            tracing::info!(session_id = %self.id, "Emergency dismissed");
            self.publish_emergency(&event);
        }
    }

    pub fn exercise_state(&self) -> &ExerciseState {
        self.exercise.state()
    }

    pub fn emergency_state(&self) -> EmergencyState {
        self.emergency.state()
    }

    pub fn summary(&self) -> SessionSummary {
        let stats = &self.stats;
        SessionSummary {
            session_id: self.id,
            frames_processed: stats.frames_processed,
            frames_skipped: stats.frames_skipped,
            frames_errored: stats.frames_errored,
            rep_count: self.exercise.state().rep_count,
            exercise_frames: stats.exercise_frames.clone(),
            emergencies_raised: stats.emergencies_raised,
            duration_ms: match (stats.first_frame, stats.last_frame) {
                (Some(first), Some(last)) => last.saturating_sub(first),
                _ => 0,
            },
        }
    }

    fn publish_emergency(&mut self, event: &EmergencyEvent) {
        match event {
            EmergencyEvent::Detected(state) => {
                self.stats.emergencies_raised += 1;
                for (_, handlers) in self.subscribers.iter_mut() {
                    if let Some(f) = handlers.on_emergency_detected.as_mut() {
                        f(state);
                    }
                }
            }
            EmergencyEvent::Resolved { previous } => {
                for (_, handlers) in self.subscribers.iter_mut() {
                    if let Some(f) = handlers.on_emergency_resolved.as_mut() {
                        f(previous);
                    }
                }
            }
        }
    }

    fn notify_exercise(&mut self, state: &ExerciseState) {
        for (_, handlers) in self.subscribers.iter_mut() {
            if let Some(f) = handlers.on_exercise_detected.as_mut() {
                f(state);
            }
        }
    }

    fn notify_skipped(&mut self, reason: &SkipReason) {
        for (_, handlers) in self.subscribers.iter_mut() {
            if let Some(f) = handlers.on_frame_skipped.as_mut() {
                f(reason);
            }
        }
    }

    fn notify_error(&mut self, err: &FrameError) {
        for (_, handlers) in self.subscribers.iter_mut() {
            if let Some(f) = handlers.on_error.as_mut() {
                f(err);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("exercise", self.exercise.state())
            .field("emergency", &self.emergency.phase())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
