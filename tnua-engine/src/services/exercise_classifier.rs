//! Exercise classification
//!
//! Per-frame heuristics over joint angles. Rules run in a fixed priority
//! order (squat, pushup, plank, jumping jack) and the first one satisfied
//! wins, because an ambiguous pose can meet several at once.

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, FormConfig};
use crate::models::exercise::ExerciseType;
use crate::models::keypoint::{Landmark, Skeleton};
use crate::services::geometry::{angle, ramp};

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub exercise: ExerciseType,
    /// Confidence (0-1); always 0 for `Unknown`
    pub confidence: f32,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            exercise: ExerciseType::Unknown,
            confidence: 0.0,
        }
    }

    fn new(exercise: ExerciseType, confidence: f32) -> Self {
        Self {
            exercise,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Heuristic exercise classifier
#[derive(Debug, Clone)]
pub struct ExerciseClassifier {
    config: ClassifierConfig,
    form: FormConfig,
}

impl ExerciseClassifier {
    pub fn new(config: &ClassifierConfig, form: &FormConfig) -> Self {
        Self {
            config: config.clone(),
            form: form.clone(),
        }
    }

    /// Classify a frame. Rules whose keypoints are missing or below
    /// `min_keypoint_score` simply do not match.
    pub fn classify(&self, skeleton: &Skeleton) -> Classification {
        let rules: [(ExerciseType, fn(&Self, &Skeleton) -> Option<f32>); 4] = [
            (ExerciseType::Squat, Self::detect_squat),
            (ExerciseType::Pushup, Self::detect_pushup),
            (ExerciseType::Plank, Self::detect_plank),
            (ExerciseType::JumpingJack, Self::detect_jumping_jack),
        ];

        rules
            .iter()
            .find_map(|(exercise, rule)| {
                rule(self, skeleton).map(|confidence| Classification::new(*exercise, confidence))
            })
            .unwrap_or_else(Classification::unknown)
    }

    /// Both knees and both hips flexed past their thresholds.
    ///
    /// The hip angle is shoulder-hip-knee; without a confident shoulder the
    /// hip stands in for it, which makes the angle degenerate (0) and the hip
    /// condition pass.
    pub fn detect_squat(&self, skeleton: &Skeleton) -> Option<f32> {
        let min = self.config.min_keypoint_score;
        let [lh, rh, lk, rk, la, ra] = skeleton.require(
            [
                Landmark::LeftHip,
                Landmark::RightHip,
                Landmark::LeftKnee,
                Landmark::RightKnee,
                Landmark::LeftAnkle,
                Landmark::RightAnkle,
            ],
            min,
        )?;

        let left_knee = angle(lh, lk, la);
        let right_knee = angle(rh, rk, ra);
        if left_knee >= self.config.squat_knee_max_deg || right_knee >= self.config.squat_knee_max_deg
        {
            return None;
        }

        let ls = skeleton.confident(Landmark::LeftShoulder, min).copied().unwrap_or(lh);
        let rs = skeleton.confident(Landmark::RightShoulder, min).copied().unwrap_or(rh);
        let left_hip = angle(ls, lh, lk);
        let right_hip = angle(rs, rh, rk);
        if left_hip >= self.config.squat_hip_max_deg || right_hip >= self.config.squat_hip_max_deg {
            return None;
        }

        let depth = 1.0 - left_knee.min(right_knee) / 180.0;
        let knee_x = (lk.x + rk.x) / 2.0;
        let ankle_x = (la.x + ra.x) / 2.0;
        let alignment = 1.0 - ((knee_x - ankle_x).abs() / self.form.knee_alignment_tolerance).min(1.0);

        Some(depth * 0.7 + alignment * 0.3)
    }

    /// Both elbows bent past the threshold with a horizontal torso
    pub fn detect_pushup(&self, skeleton: &Skeleton) -> Option<f32> {
        let [ls, rs, le, re, lw, rw, lh, rh] = skeleton.require(
            [
                Landmark::LeftShoulder,
                Landmark::RightShoulder,
                Landmark::LeftElbow,
                Landmark::RightElbow,
                Landmark::LeftWrist,
                Landmark::RightWrist,
                Landmark::LeftHip,
                Landmark::RightHip,
            ],
            self.config.min_keypoint_score,
        )?;

        let left_elbow = angle(ls, le, lw);
        let right_elbow = angle(rs, re, rw);
        let max = self.config.pushup_elbow_max_deg;
        if left_elbow >= max || right_elbow >= max {
            return None;
        }

        let drop = ((ls.y + rs.y) / 2.0 - (lh.y + rh.y) / 2.0).abs();
        if drop >= self.config.torso_horizontal_tolerance {
            return None;
        }
        let flatness = 1.0 - drop / self.config.torso_horizontal_tolerance;

        Some((1.0 - left_elbow.min(right_elbow) / 180.0) * 0.6 + flatness * 0.4)
    }

    /// Both elbows held inside the plank band
    pub fn detect_plank(&self, skeleton: &Skeleton) -> Option<f32> {
        let min = self.config.min_keypoint_score;
        let [ls, rs, le, re, lw, rw] = skeleton.require(
            [
                Landmark::LeftShoulder,
                Landmark::RightShoulder,
                Landmark::LeftElbow,
                Landmark::RightElbow,
                Landmark::LeftWrist,
                Landmark::RightWrist,
            ],
            min,
        )?;

        let band = self.config.plank_elbow_min_deg..=self.config.plank_elbow_max_deg;
        let left_elbow = angle(ls, le, lw);
        let right_elbow = angle(rs, re, rw);
        if !band.contains(&left_elbow) || !band.contains(&right_elbow) {
            return None;
        }

        let center = (band.start() + band.end()) / 2.0;
        let half_width = (band.end() - band.start()) / 2.0;
        let mean_elbow = (left_elbow + right_elbow) / 2.0;
        let hold = 1.0 - ((mean_elbow - center).abs() / half_width).min(1.0);

        let flatness = skeleton
            .require([Landmark::LeftHip, Landmark::RightHip], min)
            .map(|[lh, rh]| {
                let drop = ((ls.y + rs.y) / 2.0 - (lh.y + rh.y) / 2.0).abs();
                1.0 - (drop / self.config.torso_horizontal_tolerance).min(1.0)
            })
            .unwrap_or(0.0);

        Some(hold * 0.6 + flatness * 0.4)
    }

    /// Both wrists above their shoulders with the feet spread wide
    pub fn detect_jumping_jack(&self, skeleton: &Skeleton) -> Option<f32> {
        let [ls, rs, lw, rw, la, ra] = skeleton.require(
            [
                Landmark::LeftShoulder,
                Landmark::RightShoulder,
                Landmark::LeftWrist,
                Landmark::RightWrist,
                Landmark::LeftAnkle,
                Landmark::RightAnkle,
            ],
            self.config.min_keypoint_score,
        )?;

        if lw.y >= ls.y || rw.y >= rs.y {
            return None;
        }
        let spread = (la.x - ra.x).abs();
        if spread <= self.config.jumping_jack_min_ankle_spread {
            return None;
        }

        let reach = ((ls.y - lw.y) + (rs.y - rw.y)) / 2.0;
        let raise = ramp(reach, 0.0, self.form.arm_raise_full);

        Some(raise * 0.6 + spread.clamp(0.0, 1.0) * 0.4)
    }
}
