//! Engine configuration (JSON file, overridden by CLI flags)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::ClassifierChoice;
use crate::types::{EngineError, Language};
use crate::{FRAME_HEIGHT, FRAME_INTERVAL_MS, FRAME_WIDTH, RECOGNITION_TIMEOUT_MS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the gesture recognition service
    pub recognizer_url: String,
    /// Base URL of the catalog / progress backend
    pub backend_url: String,
    pub frame_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub language: Language,
    pub user_id: u32,
    pub classifier: ClassifierChoice,
    /// Speak/print cues
    pub audio_feedback: bool,
    /// Write progress as JSON lines here instead of posting it
    pub progress_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recognizer_url: "http://localhost:8000".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            frame_interval_ms: FRAME_INTERVAL_MS,
            request_timeout_ms: RECOGNITION_TIMEOUT_MS,
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            language: Language::default(),
            user_id: 1,
            classifier: ClassifierChoice::default(),
            audio_feedback: true,
            progress_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.frame_interval_ms == 0 {
            return Err(EngineError::Config("frame_interval_ms must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(EngineError::Config("request_timeout_ms must be positive".into()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(EngineError::Config("frame geometry must be positive".into()));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"language": "hindi", "classifier": "point_count"}"#)
            .unwrap();
        assert_eq!(config.language, Language::Hindi);
        assert_eq!(config.classifier, ClassifierChoice::PointCount);
        assert_eq!(config.frame_interval_ms, FRAME_INTERVAL_MS);
        assert_eq!(config.user_id, 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = EngineConfig::from_json(r#"{"frame_interval_ms": 0}"#).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
