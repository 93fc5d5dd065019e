//! Chat session store
//!
//! Owns the ordered exchanges and the draft. Sends are optimistic: the user
//! message shows up at once with a pending reply, and a failed request takes
//! it back out and puts the text back in the draft.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{AssistantSlot, ChatExchange, DraftBuffer, ExchangeId, ExchangeStatus, SessionError, SessionSnapshot};
use crate::backend::{ChatRequest, TextReply};
use crate::request::{RequestError, RequestHandle, RequestLifecycleManager};

/// The request behind the pending exchange
struct InFlight {
    id: ExchangeId,
    handle: RequestHandle<TextReply>,
}

/// Settlement of the pending exchange's request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: ExchangeId,
    pub outcome: Result<String, RequestError>,
}

/// What applying a completion did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Reply stored on the exchange
    Settled(ExchangeId),
    /// Exchange removed, text restored to the draft
    RolledBack { exchange: ChatExchange, error: RequestError },
    /// Exchange no longer exists (session cleared or rolled back meanwhile)
    Stale(ExchangeId),
}

/// Single-flight chat session
pub struct SessionStore {
    exchanges: Vec<ChatExchange>,
    draft: DraftBuffer,
    next_seq: u64,
    lifecycle: RequestLifecycleManager,
    timeout: Duration,
    in_flight: Option<InFlight>,
}

impl SessionStore {
    pub fn new(lifecycle: RequestLifecycleManager) -> Self {
        let timeout = lifecycle.default_timeout();
        Self::with_timeout(lifecycle, timeout)
    }

    pub fn with_timeout(lifecycle: RequestLifecycleManager, timeout: Duration) -> Self {
        debug!(?timeout, "SessionStore::new: called");
        Self {
            exchanges: Vec::new(),
            draft: DraftBuffer::new(),
            next_seq: 0,
            lifecycle,
            timeout,
            in_flight: None,
        }
    }

    /// Submit a user message and send it
    ///
    /// Blank text is rejected. While an exchange is pending this changes
    /// nothing and returns the pending id. Must be called from within a Tokio
    /// runtime.
    pub fn append_user_message(&mut self, text: &str) -> Result<ExchangeId, SessionError> {
        debug!(len = text.len(), "append_user_message: called");
        let text = text.trim();
        if text.is_empty() {
            debug!("append_user_message: blank input");
            return Err(SessionError::EmptyInput);
        }

        if let Some(pending) = self.pending_id() {
            debug!(%pending, "append_user_message: exchange already pending, ignoring");
            return Ok(pending);
        }

        let history: Vec<String> = self.exchanges.iter().filter_map(ChatExchange::history_line).collect();

        self.next_seq += 1;
        let id = ExchangeId::new(self.next_seq);
        self.exchanges.push(ChatExchange::pending(id, text.to_string()));
        self.draft.clear();

        let request = ChatRequest {
            history,
            user_message: text.to_string(),
        };
        let handle = self.lifecycle.issue(request, self.timeout);
        self.in_flight = Some(InFlight { id, handle });

        info!(%id, "append_user_message: sent");
        Ok(id)
    }

    /// Send whatever is in the draft
    pub fn submit_draft(&mut self) -> Result<ExchangeId, SessionError> {
        let text = self.draft.as_str().to_string();
        self.append_user_message(&text)
    }

    /// Store the reply for a pending exchange
    ///
    /// Returns false (and does nothing) if the exchange is gone or not pending.
    pub fn settle(&mut self, id: ExchangeId, assistant_text: impl Into<String>) -> bool {
        debug!(%id, "settle: called");
        let Some(exchange) = self.exchanges.iter_mut().find(|e| e.id == id && e.is_pending()) else {
            debug!(%id, "settle: no pending exchange with this id");
            return false;
        };

        exchange.assistant = AssistantSlot::Text(assistant_text.into());
        exchange.status = ExchangeStatus::Settled;
        self.release_in_flight(id);
        true
    }

    /// Remove the most recent exchange and put its text back in the draft
    ///
    /// Only the last exchange can be rolled back; any other id is a no-op.
    /// A request still in flight for it is aborted.
    pub fn rollback(&mut self, id: ExchangeId) -> Option<ChatExchange> {
        debug!(%id, "rollback: called");
        if self.exchanges.last().is_none_or(|last| last.id != id) {
            debug!(%id, "rollback: not the most recent exchange");
            return None;
        }

        self.release_in_flight(id);
        let exchange = self.exchanges.pop()?;
        self.draft.set(exchange.user_text.clone());
        Some(exchange)
    }

    /// Roll back after a failed request; the returned exchange is marked failed
    pub fn fail(&mut self, id: ExchangeId, error: &RequestError) -> Option<ChatExchange> {
        warn!(%id, %error, "fail: request failed, rolling back");
        let mut exchange = self.rollback(id)?;
        exchange.status = ExchangeStatus::Failed;
        Some(exchange)
    }

    /// Roll back the most recent exchange so it can be edited and resent
    pub fn retry_last(&mut self) -> Option<ChatExchange> {
        debug!("retry_last: called");
        let id = self.exchanges.last()?.id;
        self.rollback(id)
    }

    /// Abort the outstanding request and roll its exchange back
    pub fn cancel_pending(&mut self) -> Option<ChatExchange> {
        let id = self.pending_id()?;
        info!(%id, "cancel_pending: cancelling");
        self.rollback(id)
    }

    /// Empty the session and the draft, cancelling any request in flight
    pub fn clear(&mut self) {
        info!(count = self.exchanges.len(), "clear: called");
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
        self.exchanges.clear();
        self.draft.clear();
    }

    /// Wait for the in-flight request to settle
    ///
    /// Returns `None` if nothing is in flight or the request was aborted.
    /// Cancel-safe.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let in_flight = self.in_flight.as_mut()?;
        let id = in_flight.id;
        debug!(%id, "next_completion: waiting");

        let settled = in_flight.handle.wait().await;
        self.in_flight = None;

        let outcome = settled?.map(TextReply::into_text);
        Some(Completion { id, outcome })
    }

    /// Apply a completion: success settles, failure rolls back
    pub fn apply(&mut self, completion: Completion) -> Applied {
        let Completion { id, outcome } = completion;
        match outcome {
            Ok(text) => {
                if self.settle(id, text) {
                    Applied::Settled(id)
                } else {
                    Applied::Stale(id)
                }
            }
            Err(error) => match self.fail(id, &error) {
                Some(exchange) => Applied::RolledBack { exchange, error },
                None => Applied::Stale(id),
            },
        }
    }

    /// Wait for the pending request and apply its result
    pub async fn drive(&mut self) -> Option<Applied> {
        let completion = self.next_completion().await?;
        Some(self.apply(completion))
    }

    pub fn exchanges(&self) -> &[ChatExchange] {
        &self.exchanges
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exchanges: self.exchanges.clone(),
            pending: self.is_pending(),
        }
    }

    pub fn pending_id(&self) -> Option<ExchangeId> {
        self.exchanges.iter().find(|e| e.is_pending()).map(|e| e.id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_id().is_some()
    }

    pub fn exchange(&self, id: ExchangeId) -> Option<&ChatExchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    pub fn draft(&self) -> &str {
        self.draft.as_str()
    }

    /// Replace the draft (typing)
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft.set(text);
    }

    /// Mutable draft, for producers that append (dictation)
    pub fn draft_mut(&mut self) -> &mut DraftBuffer {
        &mut self.draft
    }

    fn release_in_flight(&mut self, id: ExchangeId) {
        if self.in_flight.as_ref().is_some_and(|f| f.id == id)
            && let Some(in_flight) = self.in_flight.take()
        {
            in_flight.handle.abort();
        }
    }
}
