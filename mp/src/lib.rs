//! MedPrompt - conversational core of a health assistant
//!
//! Talks to a remote inference backend and keeps the client-side state of a
//! health chat consistent: optimistic sends that roll back on failure, timed
//! and abortable requests, voice dictation into the draft, copy with
//! transient feedback, and multi-day plans laid out on a calendar.
//!
//! # Core Concepts
//!
//! - **Single-flight chat**: at most one exchange waits for a reply
//! - **Optimistic updates**: the message shows at once and is taken back on failure
//! - **Explicit state containers**: everything is testable without a UI
//! - **Self-expiring feedback**: notices and copy flags clear on a timer
//!
//! # Modules
//!
//! - [`session`] - Chat exchanges, draft buffer, session store
//! - [`request`] - Request lifecycle: timeout, abort, error classification
//! - [`backend`] - Endpoint contracts and the HTTP transport
//! - [`dictation`] - Speech-to-text into the draft
//! - [`clipboard`] - Copy with "copied" feedback
//! - [`plan`] - Plan text to date-keyed calendar
//! - [`assistant`] - The state container front ends drive
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod assistant;
pub mod backend;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod dictation;
pub mod expiry;
pub mod notice;
pub mod plan;
pub mod repl;
pub mod request;
pub mod session;

// Re-export commonly used types
pub use assistant::{AssistantCore, AssistantError, QUICK_QUESTIONS};
pub use backend::{Backend, DailyTip, Endpoint, HttpBackend, Vitals, create_backend};
pub use clipboard::{ClipboardBackend, ClipboardError, ClipboardService, MemoryClipboard};
pub use config::Config;
pub use dictation::{DictationBridge, DictationError, DictationState, SpeechCapability};
pub use notice::NoticeBoard;
pub use plan::{PlanCalendar, parse_plan};
pub use request::{RequestError, RequestHandle, RequestLifecycleManager};
pub use session::{
    Applied, ChatExchange, Completion, DraftBuffer, ExchangeId, ExchangeStatus, SessionError, SessionSnapshot,
    SessionStore,
};
