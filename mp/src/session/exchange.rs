//! Chat exchange and draft buffer types

use std::fmt;

use serde::Serialize;

/// Placeholder shown while a reply is outstanding
pub const PENDING_MARKER: &str = "...";

/// Opaque, never-reused sequence index of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExchangeId(u64);

impl ExchangeId {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assistant side of an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AssistantSlot {
    Pending,
    Text(String),
}

impl AssistantSlot {
    pub fn text(&self) -> Option<&str> {
        match self {
            AssistantSlot::Pending => None,
            AssistantSlot::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for AssistantSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantSlot::Pending => write!(f, "{}", PENDING_MARKER),
            AssistantSlot::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExchangeStatus {
    Pending,
    Settled,
    Failed,
}

/// One user message and its (possibly pending) reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub id: ExchangeId,
    pub user_text: String,
    pub assistant: AssistantSlot,
    pub status: ExchangeStatus,
}

impl ChatExchange {
    pub(crate) fn pending(id: ExchangeId, user_text: String) -> Self {
        Self {
            id,
            user_text,
            assistant: AssistantSlot::Pending,
            status: ExchangeStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ExchangeStatus::Pending
    }

    /// Conversation line sent back to the backend as history
    pub fn history_line(&self) -> Option<String> {
        let reply = self.assistant.text()?;
        Some(format!("User: {}\nAssistant: {}", self.user_text, reply))
    }
}

/// Read-only view of the session for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub exchanges: Vec<ChatExchange>,
    pub pending: bool,
}

/// Text the user is composing
///
/// Typing replaces the whole value; dictation appends to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftBuffer {
    text: String,
}

impl DraftBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the draft (typing)
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Append dictated text, space-joined and trimmed
    pub fn append_transcript(&mut self, transcript: &str) {
        let joined = format!("{} {}", self.text, transcript);
        self.text = joined.trim().to_string();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}
