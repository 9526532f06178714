use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::keypoint::PoseModel;

/// Tunable options for one analysis session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pose_model: PoseModel,

    #[serde(default)]
    pub smoothing: SmoothingConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub reps: RepConfig,

    #[serde(default)]
    pub emergency: EmergencyConfig,
}

/// Exponential smoothing of successive frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Weight of the previous smoothed frame (0 = no smoothing)
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum score for a keypoint to take part in a rule
    #[serde(default = "default_min_keypoint_score")]
    pub min_keypoint_score: f32,

    /// Frames with a lower pose score do not update exercise state
    #[serde(default = "default_min_pose_score")]
    pub min_pose_score: f32,

    #[serde(default = "default_squat_knee_max_deg")]
    pub squat_knee_max_deg: f32,

    #[serde(default = "default_squat_hip_max_deg")]
    pub squat_hip_max_deg: f32,

    #[serde(default = "default_pushup_elbow_max_deg")]
    pub pushup_elbow_max_deg: f32,

    /// Max shoulder/hip height difference for a horizontal torso
    #[serde(default = "default_torso_horizontal_tolerance")]
    pub torso_horizontal_tolerance: f32,

    #[serde(default = "default_plank_elbow_min_deg")]
    pub plank_elbow_min_deg: f32,

    #[serde(default = "default_plank_elbow_max_deg")]
    pub plank_elbow_max_deg: f32,

    /// Ankle spread as a fraction of frame width
    #[serde(default = "default_jumping_jack_min_ankle_spread")]
    pub jumping_jack_min_ankle_spread: f32,
}

/// Form scoring and feedback geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Knee/ankle horizontal offset that zeroes the alignment term
    #[serde(default = "default_knee_alignment_tolerance")]
    pub knee_alignment_tolerance: f32,

    /// Knee angle earning full squat depth
    #[serde(default = "default_squat_full_depth_deg")]
    pub squat_full_depth_deg: f32,

    /// Knee angle treated as standing (no depth)
    #[serde(default = "default_squat_standing_deg")]
    pub squat_standing_deg: f32,

    /// Elbow angle earning full pushup depth
    #[serde(default = "default_pushup_full_depth_deg")]
    pub pushup_full_depth_deg: f32,

    /// Elbow angle treated as arms locked out (no depth)
    #[serde(default = "default_pushup_extended_deg")]
    pub pushup_extended_deg: f32,

    /// Wrist height above the shoulder counted as a fully raised arm
    #[serde(default = "default_arm_raise_full")]
    pub arm_raise_full: f32,

    /// Knee angle above which a squat is cued as too shallow
    #[serde(default = "default_shallow_knee_deg")]
    pub shallow_knee_deg: f32,

    #[serde(default = "default_knee_forward_tolerance")]
    pub knee_forward_tolerance: f32,

    /// Minimum torso incline from horizontal during a squat (radians)
    #[serde(default = "default_back_min_incline_rad")]
    pub back_min_incline_rad: f32,

    /// Nose this close to ankle height flags a dangerous posture
    #[serde(default = "default_head_ground_margin")]
    pub head_ground_margin: f32,
}

/// Repetition hysteresis and debounce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepConfig {
    #[serde(default = "default_high_watermark")]
    pub high_watermark: f32,

    #[serde(default = "default_low_watermark")]
    pub low_watermark: f32,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyConfig {
    /// Hips and shoulders must reach this score for the frame to count
    #[serde(default = "default_min_keypoint_score")]
    pub min_keypoint_score: f32,

    /// Pose score required to raise fall or collapse
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f32,

    /// Body height (normalized y) beyond which a fall is raised
    #[serde(default = "default_fall_threshold")]
    pub fall_threshold: f32,

    /// Body height (normalized y) beyond which a collapse is raised
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: f32,

    #[serde(default = "default_stuck_duration_ms")]
    pub stuck_duration_ms: u64,

    /// Quiet period after which an emergency resolves itself
    #[serde(default = "default_resolution_window_ms")]
    pub resolution_window_ms: u64,
}

// Default value functions
fn default_alpha() -> f32 {
    0.7
}

fn default_min_keypoint_score() -> f32 {
    0.5
}

fn default_min_pose_score() -> f32 {
    0.7
}

fn default_squat_knee_max_deg() -> f32 {
    100.0
}

fn default_squat_hip_max_deg() -> f32 {
    90.0
}

fn default_pushup_elbow_max_deg() -> f32 {
    90.0
}

fn default_torso_horizontal_tolerance() -> f32 {
    0.1
}

fn default_plank_elbow_min_deg() -> f32 {
    80.0
}

fn default_plank_elbow_max_deg() -> f32 {
    100.0
}

fn default_jumping_jack_min_ankle_spread() -> f32 {
    0.5
}

fn default_knee_alignment_tolerance() -> f32 {
    0.25
}

fn default_squat_full_depth_deg() -> f32 {
    90.0
}

fn default_squat_standing_deg() -> f32 {
    170.0
}

fn default_pushup_full_depth_deg() -> f32 {
    90.0
}

fn default_pushup_extended_deg() -> f32 {
    160.0
}

fn default_arm_raise_full() -> f32 {
    0.2
}

fn default_shallow_knee_deg() -> f32 {
    120.0
}

fn default_knee_forward_tolerance() -> f32 {
    0.05
}

fn default_back_min_incline_rad() -> f32 {
    0.5
}

fn default_head_ground_margin() -> f32 {
    0.1
}

fn default_high_watermark() -> f32 {
    80.0
}

fn default_low_watermark() -> f32 {
    30.0
}

fn default_cooldown_ms() -> u64 {
    1_000
}

fn default_detection_threshold() -> f32 {
    0.8
}

fn default_fall_threshold() -> f32 {
    0.3
}

fn default_collapse_threshold() -> f32 {
    0.4
}

fn default_stuck_duration_ms() -> u64 {
    10_000
}

fn default_resolution_window_ms() -> u64 {
    5_000
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_keypoint_score: default_min_keypoint_score(),
            min_pose_score: default_min_pose_score(),
            squat_knee_max_deg: default_squat_knee_max_deg(),
            squat_hip_max_deg: default_squat_hip_max_deg(),
            pushup_elbow_max_deg: default_pushup_elbow_max_deg(),
            torso_horizontal_tolerance: default_torso_horizontal_tolerance(),
            plank_elbow_min_deg: default_plank_elbow_min_deg(),
            plank_elbow_max_deg: default_plank_elbow_max_deg(),
            jumping_jack_min_ankle_spread: default_jumping_jack_min_ankle_spread(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            knee_alignment_tolerance: default_knee_alignment_tolerance(),
            squat_full_depth_deg: default_squat_full_depth_deg(),
            squat_standing_deg: default_squat_standing_deg(),
            pushup_full_depth_deg: default_pushup_full_depth_deg(),
            pushup_extended_deg: default_pushup_extended_deg(),
            arm_raise_full: default_arm_raise_full(),
            shallow_knee_deg: default_shallow_knee_deg(),
            knee_forward_tolerance: default_knee_forward_tolerance(),
            back_min_incline_rad: default_back_min_incline_rad(),
            head_ground_margin: default_head_ground_margin(),
        }
    }
}

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            high_watermark: default_high_watermark(),
            low_watermark: default_low_watermark(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            min_keypoint_score: default_min_keypoint_score(),
            detection_threshold: default_detection_threshold(),
            fall_threshold: default_fall_threshold(),
            collapse_threshold: default_collapse_threshold(),
            stuck_duration_ms: default_stuck_duration_ms(),
            resolution_window_ms: default_resolution_window_ms(),
        }
    }
}

fn unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn degrees(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfAngleRange { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name })
    }
}

fn ordered(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min < max {
        Ok(())
    } else {
        Err(ConfigError::EmptyRange { name, min, max })
    }
}

impl EngineConfig {
    /// Check every section; a failure here is fatal for the session
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.smoothing.validate()?;
        self.classifier.validate()?;
        self.form.validate()?;
        self.reps.validate()?;
        self.emergency.validate()?;
        Ok(())
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("smoothing.alpha", self.alpha)
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("classifier.min_keypoint_score", self.min_keypoint_score)?;
        unit("classifier.min_pose_score", self.min_pose_score)?;
        degrees("classifier.squat_knee_max_deg", self.squat_knee_max_deg)?;
        degrees("classifier.squat_hip_max_deg", self.squat_hip_max_deg)?;
        degrees("classifier.pushup_elbow_max_deg", self.pushup_elbow_max_deg)?;
        degrees("classifier.plank_elbow_min_deg", self.plank_elbow_min_deg)?;
        degrees("classifier.plank_elbow_max_deg", self.plank_elbow_max_deg)?;
        ordered(
            "classifier.plank_elbow",
            self.plank_elbow_min_deg,
            self.plank_elbow_max_deg,
        )?;
        positive(
            "classifier.torso_horizontal_tolerance",
            self.torso_horizontal_tolerance,
        )?;
        unit(
            "classifier.jumping_jack_min_ankle_spread",
            self.jumping_jack_min_ankle_spread,
        )?;
        Ok(())
    }
}

impl FormConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("form.knee_alignment_tolerance", self.knee_alignment_tolerance)?;
        degrees("form.squat_full_depth_deg", self.squat_full_depth_deg)?;
        degrees("form.squat_standing_deg", self.squat_standing_deg)?;
        ordered(
            "form.squat_depth",
            self.squat_full_depth_deg,
            self.squat_standing_deg,
        )?;
        degrees("form.pushup_full_depth_deg", self.pushup_full_depth_deg)?;
        degrees("form.pushup_extended_deg", self.pushup_extended_deg)?;
        ordered(
            "form.pushup_depth",
            self.pushup_full_depth_deg,
            self.pushup_extended_deg,
        )?;
        positive("form.arm_raise_full", self.arm_raise_full)?;
        degrees("form.shallow_knee_deg", self.shallow_knee_deg)?;
        positive("form.knee_forward_tolerance", self.knee_forward_tolerance)?;
        positive("form.back_min_incline_rad", self.back_min_incline_rad)?;
        unit("form.head_ground_margin", self.head_ground_margin)?;
        Ok(())
    }
}

impl RepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("reps.high_watermark", self.high_watermark),
            ("reps.low_watermark", self.low_watermark),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::OutOfScoreRange { name, value });
            }
        }
        if self.high_watermark <= self.low_watermark {
            return Err(ConfigError::WatermarkOrder {
                high: self.high_watermark,
                low: self.low_watermark,
            });
        }
        Ok(())
    }
}

impl EmergencyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("emergency.min_keypoint_score", self.min_keypoint_score)?;
        unit("emergency.detection_threshold", self.detection_threshold)?;
        unit("emergency.fall_threshold", self.fall_threshold)?;
        unit("emergency.collapse_threshold", self.collapse_threshold)?;
        if self.stuck_duration_ms == 0 {
            return Err(ConfigError::NotPositive {
                name: "emergency.stuck_duration_ms",
            });
        }
        if self.resolution_window_ms == 0 {
            return Err(ConfigError::NotPositive {
                name: "emergency.resolution_window_ms",
            });
        }
        if self.collapse_threshold >= self.fall_threshold {
            tracing::warn!(
                fall_threshold = self.fall_threshold,
                collapse_threshold = self.collapse_threshold,
                "Fall is checked first; collapse can only fire between the two thresholds"
            );
        }
        Ok(())
    }
}
