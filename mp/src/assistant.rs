//! Assistant core: the state container front ends drive
//!
//! Owns the chat session, dictation, clipboard and notice board, and applies
//! the error policy: a failed chat send is rolled back with the draft
//! restored, and every failure ends up as one transient notice. Nothing here
//! is fatal.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{
    AskRagRequest, AskRequest, Backend, DailyTip, DailyTipRequest, DocumentAnswer, HealthTipsRequest, PlanRequest,
    Vitals, create_backend,
};
use crate::clipboard::{
    ANSWER_COPY_KEY, ClipboardBackend, ClipboardError, ClipboardService, create_clipboard, exchange_copy_key,
};
use crate::config::Config;
use crate::dictation::{DictationBridge, DictationError, DictationState, SpeechCapability, create_capability};
use crate::notice::NoticeBoard;
use crate::plan::{PlanCalendar, parse_plan};
use crate::request::{RequestError, RequestLifecycleManager};
use crate::session::{Applied, ChatExchange, ExchangeId, SessionError, SessionSnapshot, SessionStore};

/// Suggested one-shot questions
pub const QUICK_QUESTIONS: &[&str] = &[
    "What are the symptoms of diabetes?",
    "How can I prevent heart disease?",
    "What foods help lower blood pressure?",
    "What are healthy BMI ranges by age?",
    "How often should I check my glucose levels?",
    "What are the benefits of regular exercise?",
    "How much water should I drink daily?",
    "What vitamins are essential for immune health?",
];

/// Any failure surfaced by the assistant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Dictation(#[from] DictationError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("No quick question {number} (choose 1-{count})")]
    UnknownQuickQuestion { number: usize, count: usize },
}

pub struct AssistantCore {
    lifecycle: RequestLifecycleManager,
    session: SessionStore,
    dictation: DictationBridge,
    clipboard: ClipboardService,
    notices: NoticeBoard,
    answer: Option<String>,
    documents: Option<DocumentAnswer>,
}

impl AssistantCore {
    pub fn new(
        backend: Arc<dyn Backend>,
        capability: Arc<dyn SpeechCapability>,
        clipboard: Box<dyn ClipboardBackend>,
        config: &Config,
    ) -> Self {
        debug!(base_url = %config.backend.base_url, "AssistantCore::new: called");
        let lifecycle = RequestLifecycleManager::new(backend, config.backend.timeout());
        Self {
            session: SessionStore::new(lifecycle.clone()),
            lifecycle,
            dictation: DictationBridge::with_language(capability, config.dictation.language.clone()),
            clipboard: ClipboardService::new(clipboard, config.clipboard.feedback_ttl()),
            notices: NoticeBoard::new(config.session.notice_ttl()),
            answer: None,
            documents: None,
        }
    }

    /// Build the HTTP backend, speech capability and clipboard from config
    pub fn from_config(config: &Config) -> Result<Self, RequestError> {
        let backend = create_backend(&config.backend)?;
        Ok(Self::new(
            backend,
            create_capability(&config.dictation),
            create_clipboard(&config.clipboard),
            config,
        ))
    }

    // --- chat ---

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn exchanges(&self) -> &[ChatExchange] {
        self.session.exchanges()
    }

    pub fn draft(&self) -> &str {
        self.session.draft()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.session.set_draft(text);
    }

    pub fn is_pending(&self) -> bool {
        self.session.is_pending()
    }

    /// Send the draft as a chat message
    ///
    /// Blank drafts are rejected without a notice.
    pub fn send(&mut self) -> Result<ExchangeId, AssistantError> {
        debug!("send: called");
        let id = self.session.submit_draft()?;
        self.notices.dismiss();
        Ok(id)
    }

    /// Put `text` in the draft and send it
    pub fn send_message(&mut self, text: &str) -> Result<ExchangeId, AssistantError> {
        self.session.set_draft(text);
        self.send()
    }

    /// Wait for the pending chat reply and apply it
    ///
    /// A failure has already been rolled back when this returns; its
    /// message is posted as a notice.
    pub async fn drive(&mut self) -> Option<Applied> {
        let applied = self.session.drive().await?;
        if let Applied::RolledBack { error, .. } = &applied {
            self.notices.post(error.to_string());
        }
        Some(applied)
    }

    pub fn retry_last(&mut self) -> Option<ChatExchange> {
        self.session.retry_last()
    }

    pub fn cancel_pending(&mut self) -> Option<ChatExchange> {
        self.session.cancel_pending()
    }

    /// Reset the chat: session, draft, notice and copy flags
    pub fn clear(&mut self) {
        info!("clear: called");
        self.session.clear();
        self.notices.dismiss();
        self.clipboard.clear_feedback();
    }

    // --- one-shot ask ---

    /// Ask a single question outside the chat
    ///
    /// On failure the previous answer is kept.
    pub async fn ask(&mut self, prompt: &str) -> Result<&str, AssistantError> {
        debug!(len = prompt.len(), "ask: called");
        let prompt = self.question(prompt)?;
        match self.lifecycle.execute(AskRequest { prompt }).await {
            Ok(reply) => {
                let answer = self.answer.insert(reply.into_text());
                Ok(answer.as_str())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Ask one of the predefined questions (zero-based index)
    pub async fn ask_quick(&mut self, index: usize) -> Result<&str, AssistantError> {
        let Some(question) = QUICK_QUESTIONS.get(index) else {
            return Err(self.report(AssistantError::UnknownQuickQuestion {
                number: index.saturating_add(1),
                count: QUICK_QUESTIONS.len(),
            }));
        };
        self.ask(question).await
    }

    /// Latest one-shot answer
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Ask a question against the uploaded medical documents
    ///
    /// Same policy as [`ask`](Self::ask): blank prompts post a notice and a
    /// failure keeps the previous answer.
    pub async fn ask_documents(&mut self, prompt: &str) -> Result<&DocumentAnswer, AssistantError> {
        debug!(len = prompt.len(), "ask_documents: called");
        let prompt = self.question(prompt)?;
        match self.lifecycle.execute(AskRagRequest { prompt }).await {
            Ok(reply) => {
                let answer = reply.into_answer();
                info!(context_len = answer.context.len(), "ask_documents: answered");
                let answer = &*self.documents.insert(answer);
                Ok(answer)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Latest document answer
    pub fn document_answer(&self) -> Option<&DocumentAnswer> {
        self.documents.as_ref()
    }

    /// Trimmed prompt, or a notice when it is blank
    fn question(&mut self, prompt: &str) -> Result<String, AssistantError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.report(SessionError::EmptyInput.into()));
        }
        self.notices.dismiss();
        Ok(prompt.to_string())
    }

    // --- plans and tips ---

    /// Request a multi-day plan for these vitals and lay it out from `start`
    pub async fn generate_plan(&mut self, vitals: Vitals, start: NaiveDate) -> Result<PlanCalendar, AssistantError> {
        debug!(?vitals, %start, "generate_plan: called");
        match self.lifecycle.execute(PlanRequest { vitals }).await {
            Ok(reply) => {
                let calendar = parse_plan(&reply.plan, start);
                info!(days = calendar.len(), "generate_plan: plan parsed");
                Ok(calendar)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    pub async fn health_tips(&mut self, vitals: Vitals, risk_score: f64) -> Result<String, AssistantError> {
        debug!(?vitals, risk_score, "health_tips: called");
        match self.lifecycle.execute(HealthTipsRequest { vitals, risk_score }).await {
            Ok(reply) => Ok(reply.tips),
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Tip of the day; any failure yields the fallback tip
    pub async fn daily_tip(&self) -> DailyTip {
        debug!("daily_tip: called");
        match self.lifecycle.execute(DailyTipRequest).await {
            Ok(tip) => tip,
            Err(e) => {
                warn!(error = %e, "daily_tip: using fallback");
                DailyTip::fallback()
            }
        }
    }

    // --- clipboard ---

    /// Copy an exchange's reply; returns false when it has no reply yet
    pub fn copy_exchange(&mut self, id: ExchangeId) -> Result<bool, AssistantError> {
        debug!(%id, "copy_exchange: called");
        let Some(text) = self
            .session
            .exchange(id)
            .and_then(|e| e.assistant.text())
            .map(str::to_string)
        else {
            return Ok(false);
        };

        match self.clipboard.copy(&text, &exchange_copy_key(id)) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Copy the latest one-shot answer; returns false when there is none
    pub fn copy_answer(&mut self) -> Result<bool, AssistantError> {
        debug!("copy_answer: called");
        let Some(text) = self.answer.clone() else {
            return Ok(false);
        };

        match self.clipboard.copy(&text, ANSWER_COPY_KEY) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.report(e.into())),
        }
    }

    pub fn is_copied(&self, key: &str) -> bool {
        self.clipboard.is_copied(key)
    }

    // --- dictation ---

    pub fn dictation_state(&self) -> &DictationState {
        self.dictation.state()
    }

    pub fn start_dictation(&mut self) -> Result<(), AssistantError> {
        match self.dictation.start() {
            Ok(()) => {
                self.notices.dismiss();
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    pub fn stop_dictation(&mut self) {
        self.dictation.stop();
    }

    /// Wait for dictation to finish; a transcript is appended to the draft
    ///
    /// Returns `None` when not listening or when dictation was stopped.
    pub async fn dictate(&mut self) -> Option<Result<String, AssistantError>> {
        let outcome = self.dictation.next_outcome(self.session.draft_mut()).await?;
        Some(outcome.map_err(|e| self.report(e.into())))
    }

    // --- notices ---

    /// Message currently showing, if any
    pub fn notice(&self) -> Option<String> {
        self.notices.current()
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.dismiss();
    }

    fn report(&mut self, error: AssistantError) -> AssistantError {
        warn!(%error, "report: posting notice");
        self.notices.post(error.to_string());
        error
    }
}
