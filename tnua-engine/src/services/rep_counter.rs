//! Repetition counting
//!
//! Two watermarks (hysteresis) plus a cooldown (debounce). A rep is counted
//! on the down-crossing out of `InPosition`, and only if the cooldown has
//! elapsed since the previous counted rep.

use serde::{Deserialize, Serialize};

use crate::config::RepConfig;
use crate::models::exercise::RepPhase;

/// Repetition cycle carried between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepCycle {
    pub phase: RepPhase,
    pub count: u32,
    pub last_rep_time: Option<i64>,
}

/// Emitted by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RepEvent {
    /// Form score crossed above the high watermark
    EnteredPosition { at: i64 },
    RepCounted { count: u32, at: i64 },
    /// Down-crossing inside the cooldown; phase resets, count does not move
    RepSuppressed { at: i64, since_last_ms: i64 },
}

/// Advance `cycle` with one form score observed at `now`
pub fn transition(
    cycle: RepCycle,
    form_score: f32,
    now: i64,
    config: &RepConfig,
) -> (RepCycle, Option<RepEvent>) {
    match cycle.phase {
        RepPhase::OutOfPosition if form_score > config.high_watermark => (
            RepCycle {
                phase: RepPhase::InPosition,
                ..cycle
            },
            Some(RepEvent::EnteredPosition { at: now }),
        ),
        RepPhase::InPosition if form_score < config.low_watermark => {
            let since_last = cycle.last_rep_time.map(|last| now.saturating_sub(last));
            match since_last {
                Some(elapsed) if elapsed < config.cooldown_ms as i64 => (
                    RepCycle {
                        phase: RepPhase::OutOfPosition,
                        ..cycle
                    },
                    Some(RepEvent::RepSuppressed {
                        at: now,
                        since_last_ms: elapsed,
                    }),
                ),
                _ => {
                    let count = cycle.count.saturating_add(1);
                    (
                        RepCycle {
                            phase: RepPhase::OutOfPosition,
                            count,
                            last_rep_time: Some(now),
                        },
                        Some(RepEvent::RepCounted { count, at: now }),
                    )
                }
            }
        }
        _ => (cycle, None),
    }
}

/// Stateful wrapper over [`transition`]
#[derive(Debug, Clone)]
pub struct RepCounter {
    config: RepConfig,
    cycle: RepCycle,
}

impl RepCounter {
    pub fn new(config: &RepConfig) -> Self {
        Self {
            config: config.clone(),
            cycle: RepCycle::default(),
        }
    }

    pub fn update(&mut self, form_score: f32, now: i64) -> Option<RepEvent> {
        let (cycle, event) = transition(self.cycle, form_score, now, &self.config);
        if cycle.phase != self.cycle.phase {
            tracing::debug!(from = ?self.cycle.phase, to = ?cycle.phase, form_score, "Rep phase changed");
        }
        self.cycle = cycle;
        event
    }

    /// Abandon a half-finished rep without touching the count
    pub fn reset_phase(&mut self) {
        self.cycle.phase = RepPhase::OutOfPosition;
    }

    pub fn reset(&mut self) {
        self.cycle = RepCycle::default();
    }

    pub fn cycle(&self) -> RepCycle {
        self.cycle
    }
}
