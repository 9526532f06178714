use thiserror::Error;

use crate::models::keypoint::{Landmark, PoseModel};

/// Invalid engine options. Detected when a session is created and never
/// recoverable per frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },

    #[error("{name} must be within [0, 100], got {value}")]
    OutOfScoreRange { name: &'static str, value: f32 },

    #[error("{name} must be within [0, 180] degrees, got {value}")]
    OutOfAngleRange { name: &'static str, value: f32 },

    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },

    #[error("high watermark ({high}) must be greater than low watermark ({low})")]
    WatermarkOrder { high: f32, low: f32 },

    #[error("{name} range is empty: {min}..{max}")]
    EmptyRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
}

/// A single frame that cannot be analysed. The frame is skipped and reported;
/// the session keeps running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Unknown landmark name: {0}")]
    UnknownLandmark(String),

    #[error("Landmark {} appears more than once", .0.name())]
    DuplicateLandmark(Landmark),

    #[error("Landmark {} has a non-finite coordinate", .0.name())]
    NonFiniteCoordinate(Landmark),

    #[error("Landmark {} has score {score} outside [0, 1]", .landmark.name())]
    KeypointScoreOutOfRange { landmark: Landmark, score: f32 },

    #[error("Pose score {0} outside [0, 1]")]
    PoseScoreOutOfRange(f32),

    #[error("{model} frames carry {expected} landmarks, got {actual}")]
    LandmarkCountMismatch {
        model: PoseModel,
        expected: usize,
        actual: usize,
    },

    #[error("Frame at {current}ms arrived after frame at {previous}ms")]
    OutOfOrder { previous: i64, current: i64 },
}
