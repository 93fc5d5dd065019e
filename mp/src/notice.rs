//! Transient error notice (the dismissable banner)

use std::time::Duration;

use tracing::debug;

use crate::expiry::ExpiringSlots;

/// How long a notice stays up
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// Holds at most one user-facing message that dismisses itself
pub struct NoticeBoard {
    slot: ExpiringSlots<(), String>,
    ttl: Duration,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: ExpiringSlots::new(),
            ttl,
        }
    }

    /// Show a message, replacing the current one and restarting the timer
    pub fn post(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "NoticeBoard::post: called");
        self.slot.insert((), message, self.ttl);
    }

    /// Current message, if one is showing
    pub fn current(&self) -> Option<String> {
        self.slot.get(&())
    }

    pub fn dismiss(&mut self) {
        self.slot.remove(&());
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}
