//! Voice dictation into the draft buffer
//!
//! A [`DictationBridge`] drives one listening session at a time on top of an
//! injected [`SpeechCapability`].

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::DictationConfig;

mod bridge;
mod capability;

pub use bridge::DictationBridge;
pub use capability::{CommandRecognizer, SpeechCapability, Unsupported};

/// Recognition language used when none is configured
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Dictation failures; the display text is the user-facing notice
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DictationError {
    #[error("No speech detected. Please try again.")]
    NoSpeechDetected,

    #[error("No microphone found. Please check your microphone.")]
    NoMicrophoneFound,

    #[error("Microphone access denied. Please allow microphone access.")]
    PermissionDenied,

    #[error("Speech recognition error. Please try again.")]
    Unknown(String),

    #[error("Speech recognition not supported on this system.")]
    CapabilityUnavailable,
}

impl DictationError {
    /// Map a recognizer error code onto an error kind
    pub fn from_platform_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => DictationError::NoSpeechDetected,
            "audio-capture" => DictationError::NoMicrophoneFound,
            "not-allowed" | "service-not-allowed" => DictationError::PermissionDenied,
            other => DictationError::Unknown(other.to_string()),
        }
    }
}

/// Create the speech capability described by the config
pub fn create_capability(config: &DictationConfig) -> Arc<dyn SpeechCapability> {
    debug!(command = ?config.command, "create_capability: called");
    match config.command.as_deref().and_then(CommandRecognizer::parse) {
        Some(recognizer) => Arc::new(recognizer),
        None => Arc::new(Unsupported),
    }
}

/// Where the bridge is in its listening cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
    ResultReady,
    Error(DictationError),
}
