// Data models for poses, exercise and emergency state

pub mod emergency;
pub mod exercise;
pub mod keypoint;

pub use emergency::*;
pub use exercise::*;
pub use keypoint::*;
