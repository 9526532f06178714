//! Geometric primitives over skeletal keypoints
//!
//! Every exercise and emergency heuristic is built from these: interior
//! joint angles, midpoints of paired landmarks and coarse height signals.
//! Coordinates are normalized image space with the origin top-left, so a
//! larger `y` is lower in the frame.

use crate::models::keypoint::{Keypoint, Landmark, Skeleton};

/// Rays shorter than this are treated as zero length
const DEGENERATE_EPSILON: f32 = 1e-6;

/// A 2D point in normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<&Keypoint> for Point {
    fn from(kp: &Keypoint) -> Self {
        Self { x: kp.x, y: kp.y }
    }
}

impl From<Keypoint> for Point {
    fn from(kp: Keypoint) -> Self {
        Self { x: kp.x, y: kp.y }
    }
}

/// Interior angle at vertex `b` formed by rays `b→a` and `b→c`, in degrees
/// within [0, 180].
///
/// Returns 0 when either ray has zero length. Collinear points with `b`
/// between `a` and `c` give 180.
pub fn angle(a: impl Into<Point>, b: impl Into<Point>, c: impl Into<Point>) -> f32 {
    let (a, b, c) = (a.into(), b.into(), c.into());
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    if bax.hypot(bay) < DEGENERATE_EPSILON || bcx.hypot(bcy) < DEGENERATE_EPSILON {
        return 0.0;
    }

    let radians = bcy.atan2(bcx) - bay.atan2(bax);
    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees.clamp(0.0, 180.0)
}

pub fn midpoint(a: impl Into<Point>, b: impl Into<Point>) -> Point {
    let (a, b) = (a.into(), b.into());
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Incline of the segment `a`–`b` from horizontal, in radians within [0, π/2]
pub fn incline(a: impl Into<Point>, b: impl Into<Point>) -> f32 {
    let (a, b) = (a.into(), b.into());
    (a.y - b.y).abs().atan2((a.x - b.x).abs())
}

/// Mean `y` of a left/right landmark pair
pub fn pair_height(
    skeleton: &Skeleton,
    left: Landmark,
    right: Landmark,
    min_score: f32,
) -> Option<f32> {
    let [l, r] = skeleton.require([left, right], min_score)?;
    Some((l.y + r.y) / 2.0)
}

/// Collapse-height signal: mean of the hip height and the shoulder height.
///
/// Larger values mean the torso sits lower in the frame. `None` unless both
/// hips and both shoulders are confident.
pub fn body_height(skeleton: &Skeleton, min_score: f32) -> Option<f32> {
    let hips = pair_height(skeleton, Landmark::LeftHip, Landmark::RightHip, min_score)?;
    let shoulders = pair_height(
        skeleton,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        min_score,
    )?;
    Some((hips + shoulders) / 2.0)
}

/// Maps `value` linearly from `zero_at` (0) to `full_at` (1), clamped.
/// Works for either direction of the range.
pub fn ramp(value: f32, zero_at: f32, full_at: f32) -> f32 {
    let span = full_at - zero_at;
    if span.abs() < DEGENERATE_EPSILON {
        return if value == full_at { 1.0 } else { 0.0 };
    }
    ((value - zero_at) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_right_angle() {
        let deg = angle(
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        );
        assert!(close(deg, 90.0), "got {deg}");
    }

    #[test]
    fn test_collinear_angle_is_straight() {
        let deg = angle(
            Point::new(0.0, 0.0),
            Point::new(0.5, 0.5),
            Point::new(1.0, 1.0),
        );
        assert!(close(deg, 180.0), "got {deg}");
    }

    #[test]
    fn test_degenerate_angle_is_zero() {
        let p = Point::new(0.3, 0.3);
        assert_eq!(angle(p, p, Point::new(1.0, 0.0)), 0.0);
        assert_eq!(angle(Point::new(1.0, 0.0), p, p), 0.0);
    }

    #[test]
    fn test_reflex_angle_is_reflected() {
        // Rays at 170 and -170 degrees are 20 degrees apart
        let b = Point::new(0.0, 0.0);
        let a = Point::new(170f32.to_radians().cos(), 170f32.to_radians().sin());
        let c = Point::new((-170f32).to_radians().cos(), (-170f32).to_radians().sin());
        assert!(close(angle(a, b, c), 20.0));
    }

    #[test]
    fn test_keypoints_convert_to_points() {
        let deg = angle(
            &Keypoint::new(0.0, 0.0, 0.9),
            &Keypoint::new(0.0, 1.0, 0.9),
            &Keypoint::new(1.0, 1.0, 0.9),
        );
        assert!(close(deg, 90.0));
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(Point::new(0.0, 0.0), Point::new(1.0, 2.0));
        assert_eq!(m, Point::new(0.5, 1.0));
    }

    #[test]
    fn test_incline_ignores_direction() {
        let flat = incline(Point::new(0.8, 0.5), Point::new(0.2, 0.5));
        let upright = incline(Point::new(0.5, 0.2), Point::new(0.5, 0.6));
        assert!(close(flat, 0.0));
        assert!(close(upright, std::f32::consts::FRAC_PI_2));
    }

    #[test]
    fn test_body_height_requires_hips_and_shoulders() {
        let mut skeleton = Skeleton::new(0.9);
        skeleton.set(Landmark::LeftHip, Keypoint::new(0.45, 0.6, 0.9));
        skeleton.set(Landmark::RightHip, Keypoint::new(0.55, 0.6, 0.9));
        assert_eq!(body_height(&skeleton, 0.5), None);

        skeleton.set(Landmark::LeftShoulder, Keypoint::new(0.4, 0.2, 0.9));
        skeleton.set(Landmark::RightShoulder, Keypoint::new(0.6, 0.2, 0.9));
        assert!(close(body_height(&skeleton, 0.5).unwrap(), 0.4));

        skeleton.set(Landmark::RightShoulder, Keypoint::new(0.6, 0.2, 0.1));
        assert_eq!(body_height(&skeleton, 0.5), None);
    }

    #[test]
    fn test_ramp_in_both_directions() {
        assert_eq!(ramp(170.0, 170.0, 90.0), 0.0);
        assert_eq!(ramp(90.0, 170.0, 90.0), 1.0);
        assert_eq!(ramp(60.0, 170.0, 90.0), 1.0);
        assert!(close(ramp(130.0, 170.0, 90.0), 0.5));
        assert!(close(ramp(0.25, 0.0, 0.5), 0.5));
    }
}
