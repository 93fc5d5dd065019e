//! Clipboard backends

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::ClipboardError;

/// Something that can take text onto a clipboard
pub trait ClipboardBackend: Send {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard
///
/// Clones share the same contents, so a test or front end can read back
/// what was copied.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        debug!(len = text.len(), "MemoryClipboard::write_text: called");
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

/// Operating system clipboard via arboard
///
/// A fresh handle is opened per copy so that constructing the service never
/// fails on machines without a display server.
#[cfg(feature = "system-clipboard")]
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "system-clipboard")]
impl ClipboardBackend for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        debug!(len = text.len(), "SystemClipboard::write_text: called");
        let mut clipboard = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Stand-in for the system clipboard in builds without arboard
///
/// Every copy fails, so the user sees a notice instead of a false "Copied!".
#[cfg(not(feature = "system-clipboard"))]
#[derive(Debug, Default)]
pub struct UnavailableClipboard;

#[cfg(not(feature = "system-clipboard"))]
impl ClipboardBackend for UnavailableClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable(
            "built without the system-clipboard feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_clones_share_contents() {
        let reader = MemoryClipboard::new();
        let mut writer = reader.clone();

        assert_eq!(reader.contents(), None);
        writer.write_text("hello").unwrap();
        assert_eq!(reader.contents().as_deref(), Some("hello"));
    }

    #[cfg(not(feature = "system-clipboard"))]
    #[test]
    fn test_unavailable_clipboard_refuses() {
        let err = UnavailableClipboard.write_text("hello").unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable(_)));
    }
}
