use serde::{Deserialize, Serialize};
use std::fmt;

/// Exercise types recognised from a single pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Squat,
    Pushup,
    Plank,
    JumpingJack,
    #[default]
    Unknown,
}

impl ExerciseType {
    pub fn is_known(self) -> bool {
        self != ExerciseType::Unknown
    }

    /// Plank is a static hold; everything else is counted in repetitions
    pub fn counts_reps(self) -> bool {
        matches!(
            self,
            ExerciseType::Squat | ExerciseType::Pushup | ExerciseType::JumpingJack
        )
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Squat => write!(f, "squat"),
            ExerciseType::Pushup => write!(f, "pushup"),
            ExerciseType::Plank => write!(f, "plank"),
            ExerciseType::JumpingJack => write!(f, "jumping_jack"),
            ExerciseType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Hysteresis phase of the repetition state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    OutOfPosition,
    /// Bottom / active phase of a repetition
    InPosition,
}

/// Technique correction for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormCue {
    LowerHips,
    KneesBehindToes,
    StraightenBack,
    KeepBodyStraight,
}

impl FormCue {
    pub fn message(self) -> &'static str {
        match self {
            FormCue::LowerHips => "Lower your hips more",
            FormCue::KneesBehindToes => "Keep your knees behind your toes",
            FormCue::StraightenBack => "Keep your back straighter",
            FormCue::KeepBodyStraight => "Keep your body in a straight line",
        }
    }
}

impl fmt::Display for FormCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Snapshot of exercise recognition for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseState {
    /// Classification of the latest analysed frame
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    /// Classification confidence (0-1)
    pub confidence: f32,
    /// Repetitions counted this session; never decreases until reset
    pub rep_count: u32,
    pub phase: RepPhase,
    /// Form quality (0-100)
    pub form_score: f32,
    /// Timestamp (ms) of the most recent counted repetition
    pub last_rep_time: Option<i64>,
    /// Exercise whose repetition cycle is being tracked
    pub active_exercise: Option<ExerciseType>,
    pub feedback: Option<FormCue>,
    /// Head at or below ankle level
    pub dangerous_posture: bool,
}

impl ExerciseState {
    pub fn is_in_position(&self) -> bool {
        self.phase == RepPhase::InPosition
    }
}

impl Default for ExerciseState {
    fn default() -> Self {
        Self {
            exercise_type: ExerciseType::Unknown,
            confidence: 0.0,
            rep_count: 0,
            phase: RepPhase::OutOfPosition,
            form_score: 0.0,
            last_rep_time: None,
            active_exercise: None,
            feedback: None,
            dangerous_posture: false,
        }
    }
}
