//! Exercise tracking
//!
//! Owns the session's `ExerciseState`. Each confident frame is classified,
//! scored against the active exercise (the latest non-unknown
//! classification) and fed to the rep counter. Frames classified `unknown`
//! still score against the active exercise so a rep that passes through a
//! neutral stance completes. Switching to a different exercise abandons the
//! half-finished rep but keeps the session's count.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::exercise::{ExerciseState, ExerciseType};
use crate::models::keypoint::Skeleton;
use crate::services::exercise_classifier::{Classification, ExerciseClassifier};
use crate::services::form_scorer::FormScorer;
use crate::services::rep_counter::{RepCounter, RepEvent};

/// Why a frame left exercise state untouched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Pose score below `classifier.min_pose_score`
    LowPoseScore { score: f32 },
    /// Keypoints needed to score the active exercise are missing or not confident
    MissingKeypoints { exercise: ExerciseType },
}

/// Outcome of one frame on the exercise path
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseUpdate {
    Updated {
        state: ExerciseState,
        classification: Classification,
        events: Vec<RepEvent>,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct ExerciseTracker {
    classifier: ExerciseClassifier,
    scorer: FormScorer,
    reps: RepCounter,
    min_pose_score: f32,
    state: ExerciseState,
}

impl ExerciseTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            classifier: ExerciseClassifier::new(&config.classifier, &config.form),
            scorer: FormScorer::new(&config.classifier, &config.form),
            reps: RepCounter::new(&config.reps),
            min_pose_score: config.classifier.min_pose_score,
            state: ExerciseState::default(),
        }
    }

    /// Process one smoothed frame observed at `now`
    pub fn process(&mut self, skeleton: &Skeleton, now: i64) -> ExerciseUpdate {
        if skeleton.score() < self.min_pose_score {
            return ExerciseUpdate::Skipped(SkipReason::LowPoseScore {
                score: skeleton.score(),
            });
        }

        let classification = self.classifier.classify(skeleton);
        let target = if classification.exercise.is_known() {
            Some(classification.exercise)
        } else {
            self.state.active_exercise
        };

        let mut events = Vec::new();
        if let Some(exercise) = target {
            let Some(assessment) = self.scorer.assess(exercise, skeleton) else {
                return ExerciseUpdate::Skipped(SkipReason::MissingKeypoints { exercise });
            };

            if self.state.active_exercise != Some(exercise) {
                if let Some(previous) = self.state.active_exercise {
                    tracing::info!(%previous, current = %exercise, "Exercise changed");
                    self.reps.reset_phase();
                }
                self.state.active_exercise = Some(exercise);
            }

            self.state.form_score = assessment.score;
            self.state.feedback = if assessment.is_engaged() {
                assessment.cue
            } else {
                None
            };

            if exercise.counts_reps() {
                if let Some(event) = self.reps.update(assessment.score, now) {
                    match event {
                        RepEvent::RepCounted { count, .. } => {
                            tracing::info!(%exercise, count, "Rep counted")
                        }
                        RepEvent::RepSuppressed { since_last_ms, .. } => {
                            tracing::debug!(%exercise, since_last_ms, "Rep inside cooldown ignored")
                        }
                        RepEvent::EnteredPosition { .. } => {}
                    }
                    events.push(event);
                }
            }
        }

        let cycle = self.reps.cycle();
        self.state.exercise_type = classification.exercise;
        self.state.confidence = classification.confidence;
        self.state.phase = cycle.phase;
        self.state.rep_count = cycle.count;
        self.state.last_rep_time = cycle.last_rep_time;
        self.state.dangerous_posture = self.scorer.dangerous_posture(skeleton);

        ExerciseUpdate::Updated {
            state: self.state.clone(),
            classification,
            events,
        }
    }

    pub fn state(&self) -> &ExerciseState {
        &self.state
    }

    /// Fresh workout: zero reps, no active exercise
    pub fn reset(&mut self) {
        self.reps.reset();
        self.state = ExerciseState::default();
    }
}
