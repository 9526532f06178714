use serde::{Deserialize, Serialize};
use std::fmt;

/// Safety conditions watched by the emergency detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyType {
    Fall,
    Collapse,
    /// Reserved for consumers; no pose heuristic raises it
    Choking,
    /// Body stayed down beyond the stuck duration
    Stuck,
    #[default]
    None,
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmergencyType::Fall => write!(f, "fall"),
            EmergencyType::Collapse => write!(f, "collapse"),
            EmergencyType::Choking => write!(f, "choking"),
            EmergencyType::Stuck => write!(f, "stuck"),
            EmergencyType::None => write!(f, "none"),
        }
    }
}

/// Snapshot of the emergency detector
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmergencyState {
    #[serde(rename = "type")]
    pub emergency_type: EmergencyType,
    /// Pose confidence of the triggering frame (0-1)
    pub confidence: f32,
    /// Timestamp (ms) of the latest qualifying signal
    pub last_detection_time: Option<i64>,
    /// Timestamp (ms) the current episode began
    pub onset_time: Option<i64>,
    pub is_active: bool,
}

impl EmergencyState {
    /// Inactive state
    pub fn idle() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state() {
        let state = EmergencyState::idle();
        assert_eq!(state.emergency_type, EmergencyType::None);
        assert!(!state.is_active);
        assert_eq!(state.last_detection_time, None);
    }

    #[test]
    fn test_emergency_type_serialization() {
        let value = serde_json::to_value(EmergencyState {
            emergency_type: EmergencyType::Fall,
            confidence: 0.9,
            last_detection_time: Some(1_000),
            onset_time: Some(1_000),
            is_active: true,
        })
        .unwrap();
        assert_eq!(value["type"], "fall");
        assert_eq!(value["last_detection_time"], 1_000);
    }
}
