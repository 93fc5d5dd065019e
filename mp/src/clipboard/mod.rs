//! Copy-to-clipboard with transient "copied" feedback

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

mod backend;
mod service;

use crate::config::{ClipboardConfig, ClipboardKind};

pub use backend::{ClipboardBackend, MemoryClipboard};
#[cfg(feature = "system-clipboard")]
pub use backend::SystemClipboard;
#[cfg(not(feature = "system-clipboard"))]
pub use backend::UnavailableClipboard;
pub use service::{ClipboardService, CopyFeedbackState};

/// How long a key stays marked as recently copied
pub const DEFAULT_FEEDBACK_TTL: Duration = Duration::from_millis(2000);

/// Key used for the one-shot answer panel
pub const ANSWER_COPY_KEY: &str = "ai-response";

/// Copy key for a chat exchange
pub fn exchange_copy_key(id: crate::session::ExchangeId) -> String {
    format!("chat-{}", id)
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Failed to copy to clipboard")]
    Unavailable(String),
}

/// Create the clipboard backend described by the config
///
/// Without the `system-clipboard` feature, `system` yields a clipboard that
/// fails every copy.
pub fn create_clipboard(config: &ClipboardConfig) -> Box<dyn ClipboardBackend> {
    debug!(backend = ?config.backend, "create_clipboard: called");
    match config.backend {
        #[cfg(feature = "system-clipboard")]
        ClipboardKind::System => Box::new(SystemClipboard::new()),
        #[cfg(not(feature = "system-clipboard"))]
        ClipboardKind::System => {
            tracing::warn!("create_clipboard: built without system-clipboard, copies will fail");
            Box::new(UnavailableClipboard)
        }
        ClipboardKind::Memory => Box::new(MemoryClipboard::new()),
    }
}
