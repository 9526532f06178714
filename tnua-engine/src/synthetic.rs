//! Synthetic poses
//!
//! Deterministic full-body poses with exact joint angles, for demos,
//! benchmarks and tests. Every builder fills all 33 landmarks.

use crate::models::keypoint::{Keypoint, Landmark, NamedKeypoint, Pose, Skeleton};

const DEFAULT_SCORE: f32 = 0.9;
const FLOOR_Y: f32 = 0.9;

const SHIN: f32 = 0.18;
const THIGH: f32 = 0.18;
const TORSO: f32 = 0.3;
const UPPER_ARM: f32 = 0.13;
const FOREARM: f32 = 0.12;
const HEAD: f32 = 0.12;

/// Forward lean of the shin during a squat
const SHIN_TILT_DEG: f32 = 10.0;

/// Builds one synthetic frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseBuilder {
    skeleton: Skeleton,
}

fn at(origin: (f32, f32), direction_deg: f32, length: f32) -> (f32, f32) {
    let rad = direction_deg.to_radians();
    (origin.0 + length * rad.cos(), origin.1 + length * rad.sin())
}

/// Image-space direction of the vector `from → to`, in degrees
fn direction(from: (f32, f32), to: (f32, f32)) -> f32 {
    (to.1 - from.1).atan2(to.0 - from.0).to_degrees()
}

impl PoseBuilder {
    fn empty() -> Self {
        Self {
            skeleton: Skeleton::new(DEFAULT_SCORE),
        }
    }

    fn put(&mut self, landmark: Landmark, (x, y): (f32, f32)) {
        self.skeleton
            .set(landmark, Keypoint::new(x, y, DEFAULT_SCORE));
    }

    fn point(&self, landmark: Landmark) -> (f32, f32) {
        self.skeleton
            .get(landmark)
            .map(|kp| (kp.x, kp.y))
            .unwrap_or_default()
    }

    /// Face, hands and feet placed around the main joints
    fn extremities(&mut self, facing: f32) {
        let nose = self.point(Landmark::Nose);
        for (landmark, dx, dy) in [
            (Landmark::LeftEyeInner, -0.01, -0.02),
            (Landmark::LeftEye, -0.02, -0.02),
            (Landmark::LeftEyeOuter, -0.03, -0.02),
            (Landmark::RightEyeInner, 0.01, -0.02),
            (Landmark::RightEye, 0.02, -0.02),
            (Landmark::RightEyeOuter, 0.03, -0.02),
            (Landmark::LeftEar, -0.05, -0.01),
            (Landmark::RightEar, 0.05, -0.01),
            (Landmark::MouthLeft, -0.015, 0.02),
            (Landmark::MouthRight, 0.015, 0.02),
        ] {
            self.put(landmark, (nose.0 + dx, nose.1 + dy));
        }

        for (wrist, pinky, index, thumb) in [
            (
                Landmark::LeftWrist,
                Landmark::LeftPinky,
                Landmark::LeftIndex,
                Landmark::LeftThumb,
            ),
            (
                Landmark::RightWrist,
                Landmark::RightPinky,
                Landmark::RightIndex,
                Landmark::RightThumb,
            ),
        ] {
            let w = self.point(wrist);
            self.put(pinky, (w.0 - 0.01, w.1 + 0.02));
            self.put(index, (w.0, w.1 + 0.025));
            self.put(thumb, (w.0 + 0.01, w.1 + 0.015));
        }

        for (ankle, heel, toe) in [
            (Landmark::LeftAnkle, Landmark::LeftHeel, Landmark::LeftFootIndex),
            (Landmark::RightAnkle, Landmark::RightHeel, Landmark::RightFootIndex),
        ] {
            let a = self.point(ankle);
            self.put(heel, (a.0 - 0.03 * facing, a.1 + 0.02));
            self.put(toe, (a.0 + 0.06 * facing, a.1 + 0.03));
        }
    }

    /// Upright, facing the camera, arms hanging straight
    pub fn standing() -> Self {
        let mut b = Self::empty();
        for (side, x_shoulder, x_hip) in [(-1.0, 0.42, 0.45), (1.0, 0.58, 0.55)] {
            let (shoulder, elbow, wrist, hip, knee, ankle) = if side < 0.0 {
                (
                    Landmark::LeftShoulder,
                    Landmark::LeftElbow,
                    Landmark::LeftWrist,
                    Landmark::LeftHip,
                    Landmark::LeftKnee,
                    Landmark::LeftAnkle,
                )
            } else {
                (
                    Landmark::RightShoulder,
                    Landmark::RightElbow,
                    Landmark::RightWrist,
                    Landmark::RightHip,
                    Landmark::RightKnee,
                    Landmark::RightAnkle,
                )
            };
            let s = (x_shoulder, 0.25);
            b.put(shoulder, s);
            b.put(elbow, (s.0, s.1 + UPPER_ARM));
            b.put(wrist, (s.0, s.1 + UPPER_ARM + FOREARM));
            b.put(hip, (x_hip, FLOOR_Y - SHIN - THIGH));
            b.put(knee, (x_hip, FLOOR_Y - SHIN));
            b.put(ankle, (x_hip, FLOOR_Y));
        }
        b.put(Landmark::Nose, (0.5, 0.25 - HEAD));
        b.extremities(1.0);
        b
    }

    /// Side-on squat with exact knee (hip-knee-ankle) and hip
    /// (shoulder-hip-knee) angles, arms hanging
    pub fn squat(knee_deg: f32, hip_deg: f32) -> Self {
        let mut b = Self::empty();
        for (offset, shoulder, elbow, wrist, hip, knee, ankle) in [
            (
                -0.02,
                Landmark::LeftShoulder,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
                Landmark::LeftHip,
                Landmark::LeftKnee,
                Landmark::LeftAnkle,
            ),
            (
                0.02,
                Landmark::RightShoulder,
                Landmark::RightElbow,
                Landmark::RightWrist,
                Landmark::RightHip,
                Landmark::RightKnee,
                Landmark::RightAnkle,
            ),
        ] {
            let a = (0.55 + offset, FLOOR_Y);
            // Shin leans forward (+x) from the ankle
            let k = at(a, -90.0 + SHIN_TILT_DEG, SHIN);
            let h = at(k, direction(k, a) + knee_deg, THIGH);
            let s = at(h, direction(h, k) - hip_deg, TORSO);
            let e = at(s, 90.0, UPPER_ARM);
            let w = at(e, 90.0, FOREARM);

            b.put(ankle, a);
            b.put(knee, k);
            b.put(hip, h);
            b.put(shoulder, s);
            b.put(elbow, e);
            b.put(wrist, w);
        }

        let s = b.point(Landmark::LeftShoulder);
        let h = b.point(Landmark::LeftHip);
        let nose = at(s, direction(h, s), HEAD);
        b.put(Landmark::Nose, (nose.0 + 0.02, nose.1));
        b.extremities(1.0);
        b
    }

    /// Side-on pushup with an exact elbow angle; the body is a horizontal
    /// line and the wrists rest on the floor below the shoulders
    pub fn pushup(elbow_deg: f32) -> Self {
        let mut b = Self::empty();
        let body_y = 0.6;
        // Law of cosines: shoulder-to-wrist distance for the requested elbow
        let reach = (UPPER_ARM.powi(2) + FOREARM.powi(2)
            - 2.0 * UPPER_ARM * FOREARM * elbow_deg.to_radians().cos())
        .sqrt();
        let cos_shoulder =
            (UPPER_ARM.powi(2) + reach.powi(2) - FOREARM.powi(2)) / (2.0 * UPPER_ARM * reach);
        let shoulder_angle = cos_shoulder.clamp(-1.0, 1.0).acos();

        for (offset, shoulder, elbow, wrist, hip, knee, ankle) in [
            (
                -0.005,
                Landmark::LeftShoulder,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
                Landmark::LeftHip,
                Landmark::LeftKnee,
                Landmark::LeftAnkle,
            ),
            (
                0.005,
                Landmark::RightShoulder,
                Landmark::RightElbow,
                Landmark::RightWrist,
                Landmark::RightHip,
                Landmark::RightKnee,
                Landmark::RightAnkle,
            ),
        ] {
            let s = (0.3 + offset, body_y);
            let w = (s.0, s.1 + reach);
            // Elbows flare back toward the feet
            let e = (
                s.0 + UPPER_ARM * shoulder_angle.sin(),
                s.1 + UPPER_ARM * shoulder_angle.cos(),
            );
            b.put(shoulder, s);
            b.put(elbow, e);
            b.put(wrist, w);
            b.put(hip, (s.0 + TORSO, body_y));
            b.put(knee, (s.0 + TORSO + THIGH, body_y));
            b.put(ankle, (s.0 + TORSO + THIGH + SHIN, body_y));
        }
        b.put(Landmark::Nose, (0.3 - HEAD, body_y));
        b.extremities(-1.0);
        b
    }

    /// Straight-arm-to-forearm hold inside the plank elbow band
    pub fn plank() -> Self {
        Self::pushup(95.0)
    }

    /// Frontal jumping jack, open (arms overhead, feet wide) or closed
    pub fn jumping_jack(open: bool) -> Self {
        if !open {
            return Self::standing();
        }
        let mut b = Self::standing();
        for (sign, elbow, wrist, knee, ankle) in [
            (
                -1.0,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
                Landmark::LeftKnee,
                Landmark::LeftAnkle,
            ),
            (
                1.0,
                Landmark::RightElbow,
                Landmark::RightWrist,
                Landmark::RightKnee,
                Landmark::RightAnkle,
            ),
        ] {
            b.put(elbow, (0.5 + sign * 0.14, 0.16));
            b.put(wrist, (0.5 + sign * 0.18, 0.06));
            b.put(knee, (0.5 + sign * 0.2, 0.72));
            b.put(ankle, (0.5 + sign * 0.3, FLOOR_Y));
        }
        b.extremities(1.0);
        b
    }

    /// Flat on the floor, head toward -x
    pub fn lying() -> Self {
        let mut b = Self::empty();
        let y = 0.85;
        for (offset, shoulder, elbow, wrist, hip, knee, ankle) in [
            (
                -0.005,
                Landmark::LeftShoulder,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
                Landmark::LeftHip,
                Landmark::LeftKnee,
                Landmark::LeftAnkle,
            ),
            (
                0.005,
                Landmark::RightShoulder,
                Landmark::RightElbow,
                Landmark::RightWrist,
                Landmark::RightHip,
                Landmark::RightKnee,
                Landmark::RightAnkle,
            ),
        ] {
            let x = 0.25 + offset;
            b.put(shoulder, (x, y));
            b.put(elbow, (x + UPPER_ARM, y));
            b.put(wrist, (x + UPPER_ARM + FOREARM, y));
            b.put(hip, (x + TORSO, y));
            b.put(knee, (x + TORSO + THIGH, y));
            b.put(ankle, (x + TORSO + THIGH + SHIN, y));
        }
        b.put(Landmark::Nose, (0.25 - HEAD, y));
        b.extremities(-1.0);
        b
    }

    /// Rotate each forearm about its elbow to the given elbow angle
    pub fn bend_elbows(mut self, elbow_deg: f32) -> Self {
        for (shoulder, elbow, wrist) in [
            (Landmark::LeftShoulder, Landmark::LeftElbow, Landmark::LeftWrist),
            (Landmark::RightShoulder, Landmark::RightElbow, Landmark::RightWrist),
        ] {
            let s = self.point(shoulder);
            let e = self.point(elbow);
            self.put(wrist, at(e, direction(e, s) - elbow_deg, FOREARM));
        }
        self
    }

    /// Shift the listed landmarks, keeping their scores
    pub fn move_landmarks(mut self, landmarks: &[Landmark], dx: f32, dy: f32) -> Self {
        for landmark in landmarks {
            if let Some(kp) = self.skeleton.get(*landmark).copied() {
                self.skeleton.set(
                    *landmark,
                    Keypoint {
                        x: kp.x + dx,
                        y: kp.y + dy,
                        ..kp
                    },
                );
            }
        }
        self
    }

    /// Shift the whole body
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        self.move_landmarks(&Landmark::ALL, dx, dy)
    }

    /// Aggregate pose score
    pub fn score(mut self, score: f32) -> Self {
        let mut skeleton = Skeleton::new(score);
        for (landmark, kp) in self.skeleton.iter() {
            skeleton.set(landmark, *kp);
        }
        self.skeleton = skeleton;
        self
    }

    /// Set every keypoint's score
    pub fn keypoint_score(mut self, score: f32) -> Self {
        for landmark in Landmark::ALL {
            if let Some(kp) = self.skeleton.get(landmark).copied() {
                self.skeleton.set(landmark, Keypoint { score, ..kp });
            }
        }
        self
    }

    /// Drop a landmark from the frame
    pub fn without(mut self, landmark: Landmark) -> Self {
        let mut skeleton = Skeleton::new(self.skeleton.score());
        for (l, kp) in self.skeleton.iter().filter(|(l, _)| *l != landmark) {
            skeleton.set(l, *kp);
        }
        self.skeleton = skeleton;
        self
    }

    pub fn skeleton(&self) -> Skeleton {
        self.skeleton.clone()
    }

    /// Name-keyed frame as a pose estimator would emit it
    pub fn pose(&self) -> Pose {
        Pose {
            score: self.skeleton.score(),
            keypoints: self
                .skeleton
                .iter()
                .map(|(landmark, kp)| NamedKeypoint {
                    name: landmark.name().to_string(),
                    x: kp.x,
                    y: kp.y,
                    z: kp.z,
                    score: kp.score,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keypoint::LANDMARK_COUNT;
    use crate::services::geometry::{angle, body_height};

    fn joint(b: &PoseBuilder, a: Landmark, v: Landmark, c: Landmark) -> f32 {
        let s = b.skeleton();
        angle(s.get(a).unwrap(), s.get(v).unwrap(), s.get(c).unwrap())
    }

    #[test]
    fn test_every_builder_fills_all_landmarks() {
        for b in [
            PoseBuilder::standing(),
            PoseBuilder::squat(90.0, 80.0),
            PoseBuilder::pushup(90.0),
            PoseBuilder::plank(),
            PoseBuilder::jumping_jack(true),
            PoseBuilder::lying(),
        ] {
            assert_eq!(b.skeleton().len(), LANDMARK_COUNT);
            assert_eq!(b.pose().keypoints.len(), LANDMARK_COUNT);
        }
    }

    #[test]
    fn test_squat_angles_are_exact() {
        let b = PoseBuilder::squat(99.0, 89.0);
        let knee = joint(&b, Landmark::LeftHip, Landmark::LeftKnee, Landmark::LeftAnkle);
        let hip = joint(&b, Landmark::RightShoulder, Landmark::RightHip, Landmark::RightKnee);
        assert!((knee - 99.0).abs() < 0.01, "knee {knee}");
        assert!((hip - 89.0).abs() < 0.01, "hip {hip}");
    }

    #[test]
    fn test_pushup_elbow_is_exact() {
        let b = PoseBuilder::pushup(70.0);
        let elbow = joint(&b, Landmark::LeftShoulder, Landmark::LeftElbow, Landmark::LeftWrist);
        assert!((elbow - 70.0).abs() < 0.01, "elbow {elbow}");
    }

    #[test]
    fn test_bend_elbows() {
        let b = PoseBuilder::standing().bend_elbows(95.0);
        let elbow = joint(&b, Landmark::RightShoulder, Landmark::RightElbow, Landmark::RightWrist);
        assert!((elbow - 95.0).abs() < 0.01);
    }

    #[test]
    fn test_lying_is_low_in_frame() {
        let height = body_height(&PoseBuilder::lying().skeleton(), 0.5).unwrap();
        assert!(height > 0.8);
        let standing = body_height(&PoseBuilder::standing().skeleton(), 0.5).unwrap();
        assert!(standing < 0.5);
    }

    #[test]
    fn test_score_overrides() {
        let b = PoseBuilder::standing().score(0.4).keypoint_score(0.2);
        let s = b.skeleton();
        assert_eq!(s.score(), 0.4);
        assert!(s.iter().all(|(_, kp)| kp.score == 0.2));
        assert!(b.without(Landmark::Nose).skeleton().get(Landmark::Nose).is_none());
    }
}
