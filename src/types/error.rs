//! Error taxonomy of the interaction engine
//!
//! None of these are fatal: every failure degrades to "no interaction this cycle".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Frame source cannot be acquired; sampler stays inactive
    #[error("frame source unavailable: {0}")]
    DeviceUnavailable(String),

    /// Recognizer unreachable or answered garbage; the cycle becomes an empty event
    #[error("gesture recognition failed: {0}")]
    Recognition(String),

    /// Score forwarding failed; gameplay is unaffected
    #[error("progress persistence failed: {0}")]
    Persistence(String),

    /// Operation needs a challenge, selection or stroke that is not there
    #[error("invalid challenge state: {0}")]
    InvalidChallengeState(String),

    #[error("game catalog unavailable: {0}")]
    Catalog(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            Self::Recognition(_) => "RECOGNITION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::InvalidChallengeState(_) => "INVALID_CHALLENGE_STATE",
            Self::Catalog(_) => "CATALOG_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn invalid_state(what: impl Into<String>) -> Self {
        Self::InvalidChallengeState(what.into())
    }
}
