//! Chat session: exchanges, draft, optimistic send with rollback

use thiserror::Error;

mod exchange;
mod store;

pub use exchange::{
    AssistantSlot, ChatExchange, DraftBuffer, ExchangeId, ExchangeStatus, PENDING_MARKER, SessionSnapshot,
};
pub use store::{Applied, Completion, SessionStore};

/// Session input errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please enter a question")]
    EmptyInput,
}
