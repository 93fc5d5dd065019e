//! Dictation state machine

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DEFAULT_LANGUAGE, DictationError, DictationState, SpeechCapability};
use crate::session::DraftBuffer;

/// One running listen task
struct ListeningSession {
    cancel: CancellationToken,
    task: JoinHandle<Result<String, DictationError>>,
}

impl ListeningSession {
    fn cancel(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Drives one listening session at a time
///
/// `Idle -> Listening -> (ResultReady | Error)`; `stop` returns to `Idle`
/// from anywhere. Dropping the bridge stops any running session.
pub struct DictationBridge {
    capability: Arc<dyn SpeechCapability>,
    language: String,
    state: DictationState,
    session: Option<ListeningSession>,
}

impl DictationBridge {
    pub fn new(capability: Arc<dyn SpeechCapability>) -> Self {
        Self::with_language(capability, DEFAULT_LANGUAGE)
    }

    pub fn with_language(capability: Arc<dyn SpeechCapability>, language: impl Into<String>) -> Self {
        let language = language.into();
        debug!(%language, "DictationBridge::new: called");
        Self {
            capability,
            language,
            state: DictationState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> &DictationState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// Begin listening
    ///
    /// No-op while already listening. Must be called from within a Tokio
    /// runtime.
    pub fn start(&mut self) -> Result<(), DictationError> {
        debug!(state = ?self.state, "DictationBridge::start: called");
        if self.is_listening() {
            debug!("DictationBridge::start: already listening");
            return Ok(());
        }

        if !self.capability.is_available() {
            warn!("DictationBridge::start: speech capability unavailable");
            return Err(DictationError::CapabilityUnavailable);
        }

        let cancel = CancellationToken::new();
        let capability = self.capability.clone();
        let language = self.language.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { capability.listen(&language, token).await });

        self.session = Some(ListeningSession { cancel, task });
        self.state = DictationState::Listening;
        info!(language = %self.language, "DictationBridge::start: listening");
        Ok(())
    }

    /// Stop listening and return to idle; safe to call in any state
    pub fn stop(&mut self) {
        debug!(state = ?self.state, "DictationBridge::stop: called");
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        self.state = DictationState::Idle;
    }

    /// Wait for the listening session to end
    ///
    /// A transcript is appended to `draft`. Returns `None` when not
    /// listening or when the session was stopped. Cancel-safe.
    pub async fn next_outcome(&mut self, draft: &mut DraftBuffer) -> Option<Result<String, DictationError>> {
        let session = self.session.as_mut()?;
        let joined = (&mut session.task).await;
        self.session = None;

        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                debug!("DictationBridge::next_outcome: session cancelled");
                self.state = DictationState::Idle;
                return None;
            }
            Err(e) => Err(DictationError::Unknown(e.to_string())),
        };

        let result = result.and_then(|transcript| {
            let transcript = transcript.trim().to_string();
            if transcript.is_empty() {
                Err(DictationError::NoSpeechDetected)
            } else {
                Ok(transcript)
            }
        });

        match &result {
            Ok(transcript) => {
                draft.append_transcript(transcript);
                self.state = DictationState::ResultReady;
                info!(len = transcript.len(), "DictationBridge::next_outcome: transcript appended");
            }
            Err(e) => {
                warn!(error = ?e, "DictationBridge::next_outcome: recognition failed");
                self.state = DictationState::Error(e.clone());
            }
        }
        Some(result)
    }
}

impl Drop for DictationBridge {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("DictationBridge::drop: stopping capability");
            session.cancel();
        }
    }
}
