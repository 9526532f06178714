//! Keypoint smoothing
//!
//! Exponential smoothing of successive skeletons to suppress detector jitter
//! before any geometric analysis. The filter keeps only the last smoothed
//! skeleton; each output feeds the next frame, so smoothing compounds
//! (infinite impulse response) rather than averaging a fixed window.

use crate::config::SmoothingConfig;
use crate::models::keypoint::{Keypoint, Skeleton};

/// Smooth `current` against the previous smoothed skeleton.
///
/// For every landmark present in both frames each axis becomes
/// `previous * alpha + current * (1 - alpha)`. Depth is blended only when
/// both frames carry it. Scores always come from `current`. Landmarks missing
/// from `current` stay missing; landmarks new in `current` pass through.
pub fn smooth(previous: Option<&Skeleton>, current: &Skeleton, alpha: f32) -> Skeleton {
    let Some(previous) = previous else {
        return current.clone();
    };

    let blend = |prev: f32, cur: f32| prev * alpha + cur * (1.0 - alpha);

    let mut smoothed = Skeleton::new(current.score());
    for (landmark, cur) in current.iter() {
        let keypoint = match previous.get(landmark) {
            Some(prev) => Keypoint {
                x: blend(prev.x, cur.x),
                y: blend(prev.y, cur.y),
                z: match (prev.z, cur.z) {
                    (Some(pz), Some(cz)) => Some(blend(pz, cz)),
                    _ => cur.z,
                },
                score: cur.score,
            },
            None => *cur,
        };
        smoothed.set(landmark, keypoint);
    }
    smoothed
}

/// Stateful smoothing filter owning the most recent smoothed skeleton
#[derive(Debug, Clone)]
pub struct PoseSmoother {
    alpha: f32,
    last: Option<Skeleton>,
}

impl PoseSmoother {
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            alpha: config.alpha,
            last: None,
        }
    }

    /// Smooth the next frame and remember the result
    pub fn process(&mut self, current: &Skeleton) -> Skeleton {
        let smoothed = smooth(self.last.as_ref(), current, self.alpha);
        self.last = Some(smoothed.clone());
        smoothed
    }

    /// Last smoothed skeleton, if any frame has been processed
    pub fn last(&self) -> Option<&Skeleton> {
        self.last.as_ref()
    }

    /// Forget history; the next frame passes through unchanged
    pub fn reset(&mut self) {
        self.last = None;
    }
}
