//! Keypoint and pose models
//!
//! External pose estimators hand the engine name-keyed keypoints (`Pose`).
//! Every analysis works on `Skeleton`, a fixed-size table indexed by the dense
//! `Landmark` enum, so lookups are O(1) and the set of joints a rule needs is
//! spelled out in its signature.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FrameError;

/// Number of landmarks in the full body vocabulary
pub const LANDMARK_COUNT: usize = 33;

/// Body landmarks, in BlazePose index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    /// All landmarks in index order
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Position in the dense landmark table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get landmark name
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }

    /// Look up a landmark by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|landmark| landmark.name() == name)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// COCO order used by MoveNet and other 17-point models
const COCO_LANDMARKS: [Landmark; 17] = [
    Landmark::Nose,
    Landmark::LeftEye,
    Landmark::RightEye,
    Landmark::LeftEar,
    Landmark::RightEar,
    Landmark::LeftShoulder,
    Landmark::RightShoulder,
    Landmark::LeftElbow,
    Landmark::RightElbow,
    Landmark::LeftWrist,
    Landmark::RightWrist,
    Landmark::LeftHip,
    Landmark::RightHip,
    Landmark::LeftKnee,
    Landmark::RightKnee,
    Landmark::LeftAnkle,
    Landmark::RightAnkle,
];

/// Landmark layout of the upstream pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseModel {
    /// 33 landmarks (MediaPipe BlazePose)
    #[default]
    BlazePose,
    /// 17 COCO landmarks (MoveNet, YOLO-pose)
    MoveNet,
}

impl PoseModel {
    /// Landmarks in the order the model emits them
    pub fn landmarks(self) -> &'static [Landmark] {
        match self {
            PoseModel::BlazePose => &Landmark::ALL,
            PoseModel::MoveNet => &COCO_LANDMARKS,
        }
    }
}

impl fmt::Display for PoseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseModel::BlazePose => write!(f, "blazepose"),
            PoseModel::MoveNet => write!(f, "movenet"),
        }
    }
}

/// A scored body landmark position in normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    /// X coordinate (normalized 0-1, origin left)
    pub x: f32,
    /// Y coordinate (normalized 0-1, origin top)
    pub y: f32,
    /// Relative depth, when the model provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Detection confidence (0-1)
    pub score: f32,
}

impl Keypoint {
    /// Create a new 2D keypoint
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, z: None, score }
    }

    /// Attach a depth coordinate
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Check if the keypoint is confident enough for geometric use
    pub fn is_confident(&self, min_score: f32) -> bool {
        self.score >= min_score
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f32::is_finite)
    }
}

/// Name-keyed keypoint as emitted by pose estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedKeypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    pub score: f32,
}

/// Index-ordered landmark as emitted by model runtimes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: Option<f32>,
    /// Visibility / confidence (0-1)
    pub visibility: f32,
}

/// One full-body observation from the pose estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Aggregate pose confidence (0-1)
    pub score: f32,
    pub keypoints: Vec<NamedKeypoint>,
}

impl Pose {
    /// Build a pose from a model's index-ordered output
    pub fn from_indexed(
        model: PoseModel,
        score: f32,
        landmarks: &[RawLandmark],
    ) -> Result<Self, FrameError> {
        let expected = model.landmarks();
        if landmarks.len() != expected.len() {
            return Err(FrameError::LandmarkCountMismatch {
                model,
                expected: expected.len(),
                actual: landmarks.len(),
            });
        }

        let keypoints = expected
            .iter()
            .zip(landmarks)
            .map(|(landmark, raw)| NamedKeypoint {
                name: landmark.name().to_string(),
                x: raw.x,
                y: raw.y,
                z: raw.z,
                score: raw.visibility,
            })
            .collect();

        Ok(Self { score, keypoints })
    }}

/// Fixed-size landmark table for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    keypoints: [Option<Keypoint>; LANDMARK_COUNT],
    score: f32,
}

impl Skeleton {
    /// Create an empty skeleton with the given pose score
    pub fn new(score: f32) -> Self {
        Self {
            keypoints: [None; LANDMARK_COUNT],
            score,
        }
    }

    /// Aggregate pose confidence
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.keypoints[landmark.index()].as_ref()
    }

    pub fn set(&mut self, landmark: Landmark, keypoint: Keypoint) {
        self.keypoints[landmark.index()] = Some(keypoint);
    }

    /// Keypoint for `landmark` if it is present and confident
    pub fn confident(&self, landmark: Landmark, min_score: f32) -> Option<&Keypoint> {
        self.get(landmark).filter(|kp| kp.is_confident(min_score))
    }

    /// All of `landmarks`, or `None` if any is missing or below `min_score`
    pub fn require<const N: usize>(
        &self,
        landmarks: [Landmark; N],
        min_score: f32,
    ) -> Option<[Keypoint; N]> {
        let mut found = [Keypoint::default(); N];
        for (slot, landmark) in found.iter_mut().zip(landmarks) {
            *slot = *self.confident(landmark, min_score)?;
        }
        Some(found)
    }

    /// Present landmarks with their keypoints
    pub fn iter(&self) -> impl Iterator<Item = (Landmark, &Keypoint)> + '_ {
        Landmark::ALL
            .iter()
            .zip(self.keypoints.iter())
            .filter_map(|(landmark, kp)| kp.as_ref().map(|kp| (*landmark, kp)))
    }

    /// Number of present landmarks
    pub fn len(&self) -> usize {
        self.keypoints.iter().filter(|kp| kp.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<&Pose> for Skeleton {
    type Error = FrameError;

    fn try_from(pose: &Pose) -> Result<Self, Self::Error> {
        if !(0.0..=1.0).contains(&pose.score) {
            return Err(FrameError::PoseScoreOutOfRange(pose.score));
        }

        let mut skeleton = Skeleton::new(pose.score);
        for named in &pose.keypoints {
            let landmark = Landmark::from_name(&named.name)
                .ok_or_else(|| FrameError::UnknownLandmark(named.name.clone()))?;

            if skeleton.get(landmark).is_some() {
                return Err(FrameError::DuplicateLandmark(landmark));
            }

            let keypoint = Keypoint {
                x: named.x,
                y: named.y,
                z: named.z,
                score: named.score,
            };
            if !keypoint.is_finite() {
                return Err(FrameError::NonFiniteCoordinate(landmark));
            }
            if !(0.0..=1.0).contains(&keypoint.score) {
                return Err(FrameError::KeypointScoreOutOfRange {
                    landmark,
                    score: keypoint.score,
                });
            }

            skeleton.set(landmark, keypoint);
        }

        Ok(skeleton)
    }
}
