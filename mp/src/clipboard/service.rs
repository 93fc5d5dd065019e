//! Clipboard service and copy feedback

use std::time::Duration;

use tracing::{debug, warn};

use super::{ClipboardBackend, ClipboardError};
use crate::expiry::ExpiringSlots;

/// Which keys were copied recently
///
/// A flag stays set for the TTL after the last copy on that key, then clears
/// itself. Keys do not affect each other.
pub struct CopyFeedbackState {
    flags: ExpiringSlots<String, ()>,
    ttl: Duration,
}

impl CopyFeedbackState {
    pub fn new(ttl: Duration) -> Self {
        Self {
            flags: ExpiringSlots::new(),
            ttl,
        }
    }

    pub fn mark(&mut self, key: &str) {
        self.flags.insert(key.to_string(), (), self.ttl);
    }

    pub fn is_copied(&self, key: &str) -> bool {
        self.flags.contains(&key.to_string())
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

/// Copies text and tracks per-key feedback
pub struct ClipboardService {
    backend: Box<dyn ClipboardBackend>,
    feedback: CopyFeedbackState,
}

impl ClipboardService {
    pub fn new(backend: Box<dyn ClipboardBackend>, feedback_ttl: Duration) -> Self {
        debug!(?feedback_ttl, "ClipboardService::new: called");
        Self {
            backend,
            feedback: CopyFeedbackState::new(feedback_ttl),
        }
    }

    /// Copy `text` and mark `key` as recently copied
    ///
    /// Must be called from within a Tokio runtime.
    pub fn copy(&mut self, text: &str, key: &str) -> Result<(), ClipboardError> {
        debug!(%key, len = text.len(), "copy: called");
        if let Err(e) = self.backend.write_text(text) {
            warn!(%key, error = ?e, "copy: clipboard write failed");
            return Err(e);
        }
        self.feedback.mark(key);
        Ok(())
    }

    pub fn is_copied(&self, key: &str) -> bool {
        self.feedback.is_copied(key)
    }

    pub fn feedback(&self) -> &CopyFeedbackState {
        &self.feedback
    }

    /// Drop all feedback flags and their pending expiries
    pub fn clear_feedback(&mut self) {
        self.feedback.clear();
    }
}
