use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tnua_engine::Pose;

/// One line of a recorded pose stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp_ms: i64,
    pub pose: Pose,
}

impl FrameRecord {
    pub fn new(timestamp_ms: i64, pose: Pose) -> Self {
        Self { timestamp_ms, pose }
    }

    /// Parse one JSON line; blank lines and `#` comments yield `None`
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let record = serde_json::from_str(line).context("Malformed frame record")?;
        Ok(Some(record))
    }

    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize frame record")
    }
}
