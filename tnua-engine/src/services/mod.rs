// Analysis services, leaves first

pub mod geometry;
pub mod keypoint_processor;
pub mod exercise_classifier;
pub mod form_scorer;
pub mod rep_counter;
pub mod exercise_tracker;
pub mod emergency_detection_service;
pub mod session;

pub use emergency_detection_service::{EmergencyDetector, EmergencyEvent, EmergencyPhase, Episode};
pub use exercise_classifier::{Classification, ExerciseClassifier};
pub use exercise_tracker::{ExerciseTracker, ExerciseUpdate, SkipReason};
pub use form_scorer::{FormAssessment, FormScorer};
pub use keypoint_processor::{smooth, PoseSmoother};
pub use rep_counter::{RepCounter, RepCycle, RepEvent};
pub use session::{FrameOutcome, Session, SessionHandlers, SessionSummary, SubscriptionId};
