//! Playback loop settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the playback loop does when a single frame cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameErrorPolicy {
    /// Log the frame and move on to the next one
    #[default]
    Skip,
    /// Stop playback and return the error
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Sleep between pacing checks, in milliseconds
    pub idle_ms: u64,
    pub on_frame_error: FrameErrorPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            idle_ms: 1,
            on_frame_error: FrameErrorPolicy::Skip,
        }
    }
}

impl PlaybackConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.idle(), Duration::from_millis(1));
        assert_eq!(config.on_frame_error, FrameErrorPolicy::Skip);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlaybackConfig::from_json(r#"{ "on_frame_error": "abort" }"#).expect("config");
        assert_eq!(config.on_frame_error, FrameErrorPolicy::Abort);
        assert_eq!(config.idle_ms, 1);

        let config = PlaybackConfig::from_json("{}").expect("config");
        assert_eq!(config, PlaybackConfig::default());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(PlaybackConfig::from_json(r#"{ "on_frame_error": "retry" }"#).is_err());
    }
}
