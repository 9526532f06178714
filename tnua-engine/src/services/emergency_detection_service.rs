//! Emergency detection
//!
//! Watches the collapse-height signal (mean of hip and shoulder heights)
//! independently of exercise state. States are `Idle` and `Active(episode)`;
//! an episode starts on a fall or collapse signal, escalates to `Stuck` when
//! the body stays down past the stuck duration, and resolves itself after a
//! quiet period. Time only advances through the timestamps passed in.

use serde::{Deserialize, Serialize};

use crate::config::EmergencyConfig;
use crate::models::emergency::{EmergencyState, EmergencyType};
use crate::models::keypoint::Skeleton;
use crate::services::geometry::body_height;

/// One ongoing emergency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub kind: EmergencyType,
    pub confidence: f32,
    /// When the episode began
    pub onset: i64,
    /// Latest qualifying signal (or stuck re-fire)
    pub last_detection: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EmergencyPhase {
    #[default]
    Idle,
    Active(Episode),
}

impl EmergencyPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, EmergencyPhase::Active(_))
    }

    /// Public snapshot of this phase
    pub fn snapshot(&self) -> EmergencyState {
        match self {
            EmergencyPhase::Idle => EmergencyState::idle(),
            EmergencyPhase::Active(episode) => EmergencyState {
                emergency_type: episode.kind,
                confidence: episode.confidence,
                last_detection_time: Some(episode.last_detection),
                onset_time: Some(episode.onset),
                is_active: true,
            },
        }
    }
}

/// Notifications produced by a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EmergencyEvent {
    /// New episode, a change of kind, or a stuck re-fire
    Detected(EmergencyState),
    /// Episode ended; carries the last active state
    Resolved { previous: EmergencyState },
}

/// A qualifying body-low signal in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub kind: EmergencyType,
    pub confidence: f32,
}

/// Evaluate one frame's height signal. Fall is checked before collapse.
pub fn evaluate(height: f32, pose_score: f32, config: &EmergencyConfig) -> Option<Signal> {
    if pose_score <= config.detection_threshold {
        return None;
    }
    let kind = if height > config.fall_threshold {
        EmergencyType::Fall
    } else if height > config.collapse_threshold {
        EmergencyType::Collapse
    } else {
        return None;
    };
    Some(Signal {
        kind,
        confidence: pose_score,
    })
}

/// Advance the detector. `signal` is `None` for a quiet frame or a timer
/// check.
pub fn step(
    phase: EmergencyPhase,
    signal: Option<Signal>,
    now: i64,
    config: &EmergencyConfig,
) -> (EmergencyPhase, Option<EmergencyEvent>) {
    match (phase, signal) {
        (EmergencyPhase::Idle, None) => (EmergencyPhase::Idle, None),
        (EmergencyPhase::Idle, Some(signal)) => {
            let next = EmergencyPhase::Active(Episode {
                kind: signal.kind,
                confidence: signal.confidence,
                onset: now,
                last_detection: now,
            });
            (next, Some(EmergencyEvent::Detected(next.snapshot())))
        }
        (EmergencyPhase::Active(mut episode), Some(signal)) => {
            episode.last_detection = now;
            episode.confidence = signal.confidence;

            let next_kind = if episode.kind == EmergencyType::Stuck
                || now.saturating_sub(episode.onset) > config.stuck_duration_ms as i64
            {
                EmergencyType::Stuck
            } else {
                signal.kind
            };

            if next_kind == episode.kind {
                return (EmergencyPhase::Active(episode), None);
            }
            episode.kind = next_kind;
            let next = EmergencyPhase::Active(episode);
            (next, Some(EmergencyEvent::Detected(next.snapshot())))
        }
        (EmergencyPhase::Active(mut episode), None) => {
            let quiet = now.saturating_sub(episode.last_detection);

            if episode.kind == EmergencyType::Stuck && quiet > config.stuck_duration_ms as i64 {
                episode.last_detection = now;
                let next = EmergencyPhase::Active(episode);
                return (next, Some(EmergencyEvent::Detected(next.snapshot())));
            }

            if quiet > config.resolution_window_ms as i64 {
                let previous = phase.snapshot();
                return (EmergencyPhase::Idle, Some(EmergencyEvent::Resolved { previous }));
            }

            (EmergencyPhase::Active(episode), None)
        }
    }
}

/// Stateful emergency detector for one session
#[derive(Debug, Clone)]
pub struct EmergencyDetector {
    config: EmergencyConfig,
    phase: EmergencyPhase,
}

impl EmergencyDetector {
    pub fn new(config: &EmergencyConfig) -> Self {
        Self {
            config: config.clone(),
            phase: EmergencyPhase::Idle,
        }
    }

    /// Process one smoothed frame. Frames without confident hips and
    /// shoulders leave the detector untouched.
    pub fn process(&mut self, skeleton: &Skeleton, now: i64) -> Option<EmergencyEvent> {
        let height = body_height(skeleton, self.config.min_keypoint_score)?;
        let signal = evaluate(height, skeleton.score(), &self.config);
        self.apply(signal, now)
    }

    /// Advance timers without a frame
    pub fn tick(&mut self, now: i64) -> Option<EmergencyEvent> {
        self.apply(None, now)
    }

    fn apply(&mut self, signal: Option<Signal>, now: i64) -> Option<EmergencyEvent> {
        let (phase, event) = step(self.phase, signal, now, &self.config);
        self.phase = phase;

        match &event {
            Some(EmergencyEvent::Detected(state)) => tracing::warn!(
                kind = %state.emergency_type,
                confidence = state.confidence,
                at = now,
                "Emergency detected"
            ),
            Some(EmergencyEvent::Resolved { previous }) => tracing::info!(
                kind = %previous.emergency_type,
                at = now,
                "Emergency resolved"
            ),
            None => {}
        }
        event
    }

    /// User dismissed the alert; reports a resolution if one was active
    pub fn dismiss(&mut self) -> Option<EmergencyEvent> {
        let previous = std::mem::take(&mut self.phase);
        previous.is_active().then(|| EmergencyEvent::Resolved {
            previous: previous.snapshot(),
        })
    }

    pub fn reset(&mut self) {
        self.phase = EmergencyPhase::Idle;
    }

    pub fn phase(&self) -> EmergencyPhase {
        self.phase
    }

    pub fn state(&self) -> EmergencyState {
        self.phase.snapshot()
    }
}
