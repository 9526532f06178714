//! Form scoring
//!
//! Each exercise has a range-of-motion fraction (`depth`, 0-1) and an
//! alignment quality (`alignment`, 0-1). The score is
//! `50 * depth + 50 * alignment * depth`: alignment only earns points while
//! the body is under load, so a neutral stance scores near zero and the rep
//! counter's low watermark stays reachable.

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, FormConfig};
use crate::models::exercise::{ExerciseType, FormCue};
use crate::models::keypoint::{Keypoint, Landmark, Skeleton};
use crate::services::geometry::{angle, incline, midpoint, ramp};

/// Alignment below this earns a body-line cue
const POOR_ALIGNMENT: f32 = 0.5;

/// Form quality of one frame for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormAssessment {
    /// 0-100
    pub score: f32,
    pub depth: f32,
    pub alignment: f32,
    pub cue: Option<FormCue>,
}

impl FormAssessment {
    fn new(depth: f32, alignment: f32, cue: Option<FormCue>) -> Self {
        let depth = depth.clamp(0.0, 1.0);
        let alignment = alignment.clamp(0.0, 1.0);
        Self {
            score: (50.0 * depth + 50.0 * alignment * depth).clamp(0.0, 100.0),
            depth,
            alignment,
            cue,
        }
    }

    /// True while the movement is loaded at all
    pub fn is_engaged(&self) -> bool {
        self.depth > 0.0
    }
}

/// Scores form per exercise
#[derive(Debug, Clone)]
pub struct FormScorer {
    form: FormConfig,
    min_keypoint_score: f32,
    torso_horizontal_tolerance: f32,
    plank_elbow_min_deg: f32,
    plank_elbow_max_deg: f32,
    jumping_jack_min_ankle_spread: f32,
}

impl FormScorer {
    pub fn new(classifier: &ClassifierConfig, form: &FormConfig) -> Self {
        Self {
            form: form.clone(),
            min_keypoint_score: classifier.min_keypoint_score,
            torso_horizontal_tolerance: classifier.torso_horizontal_tolerance,
            plank_elbow_min_deg: classifier.plank_elbow_min_deg,
            plank_elbow_max_deg: classifier.plank_elbow_max_deg,
            jumping_jack_min_ankle_spread: classifier.jumping_jack_min_ankle_spread,
        }
    }

    /// Assess `skeleton` as `exercise`. `None` when the keypoints the
    /// exercise needs are missing or not confident.
    pub fn assess(&self, exercise: ExerciseType, skeleton: &Skeleton) -> Option<FormAssessment> {
        match exercise {
            ExerciseType::Squat => self.assess_squat(skeleton),
            ExerciseType::Pushup => self.assess_pushup(skeleton),
            ExerciseType::Plank => self.assess_plank(skeleton),
            ExerciseType::JumpingJack => self.assess_jumping_jack(skeleton),
            ExerciseType::Unknown => None,
        }
    }

    fn assess_squat(&self, skeleton: &Skeleton) -> Option<FormAssessment> {
        let [lh, rh, lk, rk, la, ra] = skeleton.require(
            [
                Landmark::LeftHip,
                Landmark::RightHip,
                Landmark::LeftKnee,
                Landmark::RightKnee,
                Landmark::LeftAnkle,
                Landmark::RightAnkle,
            ],
            self.min_keypoint_score,
        )?;

        let left_knee = angle(lh, lk, la);
        let right_knee = angle(rh, rk, ra);
        let depth = ramp(
            (left_knee + right_knee) / 2.0,
            self.form.squat_standing_deg,
            self.form.squat_full_depth_deg,
        );

        let knee_x = (lk.x + rk.x) / 2.0;
        let ankle_x = (la.x + ra.x) / 2.0;
        let alignment = 1.0 - (knee_x - ankle_x).abs() / self.form.knee_alignment_tolerance;

        let tolerance = self.form.knee_forward_tolerance;
        let cue = if left_knee > self.form.shallow_knee_deg || right_knee > self.form.shallow_knee_deg
        {
            Some(FormCue::LowerHips)
        } else if lk.x > la.x + tolerance || rk.x > ra.x + tolerance {
            Some(FormCue::KneesBehindToes)
        } else {
            skeleton
                .require(
                    [Landmark::LeftShoulder, Landmark::RightShoulder],
                    self.min_keypoint_score,
                )
                .map(|[ls, rs]| incline(midpoint(ls, rs), midpoint(lh, rh)))
                .filter(|back| *back < self.form.back_min_incline_rad)
                .map(|_| FormCue::StraightenBack)
        };

        Some(FormAssessment::new(depth, alignment, cue))
    }

    fn assess_pushup(&self, skeleton: &Skeleton) -> Option<FormAssessment> {
        let [ls, rs, le, re, lw, rw, lh, rh] = self.arms_and_hips(skeleton)?;

        let mean_elbow = (angle(ls, le, lw) + angle(rs, re, rw)) / 2.0;
        let depth = ramp(
            mean_elbow,
            self.form.pushup_extended_deg,
            self.form.pushup_full_depth_deg,
        );
        let alignment = self.flatness(ls.y + rs.y, lh.y + rh.y);

        Some(FormAssessment::new(depth, alignment, self.body_line_cue(alignment)))
    }

    fn assess_plank(&self, skeleton: &Skeleton) -> Option<FormAssessment> {
        let [ls, rs, le, re, lw, rw, lh, rh] = self.arms_and_hips(skeleton)?;

        let center = (self.plank_elbow_min_deg + self.plank_elbow_max_deg) / 2.0;
        let half_width = (self.plank_elbow_max_deg - self.plank_elbow_min_deg) / 2.0;
        let mean_elbow = (angle(ls, le, lw) + angle(rs, re, rw)) / 2.0;
        let depth = 1.0 - (mean_elbow - center).abs() / half_width;
        let alignment = self.flatness(ls.y + rs.y, lh.y + rh.y);

        Some(FormAssessment::new(depth, alignment, self.body_line_cue(alignment)))
    }

    fn assess_jumping_jack(&self, skeleton: &Skeleton) -> Option<FormAssessment> {
        let [ls, rs, lw, rw, la, ra] = skeleton.require(
            [
                Landmark::LeftShoulder,
                Landmark::RightShoulder,
                Landmark::LeftWrist,
                Landmark::RightWrist,
                Landmark::LeftAnkle,
                Landmark::RightAnkle,
            ],
            self.min_keypoint_score,
        )?;

        let left_raise = ramp(ls.y - lw.y, 0.0, self.form.arm_raise_full);
        let right_raise = ramp(rs.y - rw.y, 0.0, self.form.arm_raise_full);
        let spread = ramp(
            (la.x - ra.x).abs(),
            0.0,
            self.jumping_jack_min_ankle_spread,
        );

        let depth = ((left_raise + right_raise) / 2.0 + spread) / 2.0;
        let symmetry = 1.0 - (left_raise - right_raise).abs();

        Some(FormAssessment::new(depth, symmetry, None))
    }

    fn arms_and_hips(&self, skeleton: &Skeleton) -> Option<[Keypoint; 8]> {
        skeleton.require(
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
            self.min_keypoint_score,
        )
    }

    /// 1 when shoulders and hips share a height, 0 at the horizontal tolerance.
    /// Takes the summed pair heights.
    fn flatness(&self, shoulders: f32, hips: f32) -> f32 {
        1.0 - ((shoulders - hips) / 2.0).abs() / self.torso_horizontal_tolerance
    }

    fn body_line_cue(&self, alignment: f32) -> Option<FormCue> {
        (alignment < POOR_ALIGNMENT).then_some(FormCue::KeepBodyStraight)
    }

    /// Head at or below ankle level: the nose sits lower than either ankle
    /// minus the ground margin.
    pub fn dangerous_posture(&self, skeleton: &Skeleton) -> bool {
        let min = self.min_keypoint_score;
        let Some(nose) = skeleton.confident(Landmark::Nose, min) else {
            return false;
        };
        [Landmark::LeftAnkle, Landmark::RightAnkle]
            .into_iter()
            .filter_map(|ankle| skeleton.confident(ankle, min))
            .any(|ankle| nose.y > ankle.y - self.form.head_ground_margin)
    }
}
