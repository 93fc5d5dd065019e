//! Integration tests for MedPrompt
//!
//! These tests drive the assistant core end to end against a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use medprompt::assistant::AssistantCore;
use medprompt::backend::{Backend, Endpoint, Vitals};
use medprompt::clipboard::{MemoryClipboard, exchange_copy_key};
use medprompt::config::Config;
use medprompt::dictation::{DictationError, SpeechCapability};
use medprompt::request::RequestError;
use medprompt::session::{Applied, ExchangeStatus};
use tokio_util::sync::CancellationToken;

/// Backend answering from a queue and recording every request
#[derive(Default)]
struct ScriptedBackend {
    answers: Mutex<VecDeque<(Duration, Result<serde_json::Value, RequestError>)>>,
    seen: Mutex<Vec<(Endpoint, serde_json::Value)>>,
}

impl ScriptedBackend {
    fn then(self, body: serde_json::Value) -> Self {
        self.answers.lock().unwrap().push_back((Duration::ZERO, Ok(body)));
        self
    }

    fn then_fail(self, error: RequestError) -> Self {
        self.answers.lock().unwrap().push_back((Duration::ZERO, Err(error)));
        self
    }

    fn then_after(self, delay: Duration, body: serde_json::Value) -> Self {
        self.answers.lock().unwrap().push_back((delay, Ok(body)));
        self
    }

    fn seen(&self) -> Vec<(Endpoint, serde_json::Value)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send(&self, endpoint: Endpoint, payload: serde_json::Value) -> Result<serde_json::Value, RequestError> {
        self.seen.lock().unwrap().push((endpoint, payload));
        let next = self.answers.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Err(RequestError::ServerError { status: 500 })));
        tokio::time::sleep(delay).await;
        result
    }
}

/// Speech that always hears the same phrase
struct FixedSpeech(&'static str);

#[async_trait]
impl SpeechCapability for FixedSpeech {
    fn is_available(&self) -> bool {
        true
    }

    async fn listen(&self, _language: &str, _cancel: CancellationToken) -> Result<String, DictationError> {
        Ok(self.0.to_string())
    }
}

fn assistant(backend: Arc<ScriptedBackend>, speech: Arc<dyn SpeechCapability>) -> (AssistantCore, MemoryClipboard) {
    let clipboard = MemoryClipboard::new();
    let core = AssistantCore::new(backend, speech, Box::new(clipboard.clone()), &Config::default());
    (core, clipboard)
}

// =============================================================================
// Chat Tests
// =============================================================================

#[tokio::test]
async fn test_failed_send_then_retry_succeeds() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .then_fail(RequestError::ServerError { status: 503 })
            .then(serde_json::json!({"response": "Aim for 150 minutes a week."})),
    );
    let (mut core, _) = assistant(backend.clone(), Arc::new(FixedSpeech("")));

    core.send_message("How much exercise do I need?").unwrap();
    let applied = core.drive().await.unwrap();
    assert!(matches!(applied, Applied::RolledBack { .. }));
    assert!(core.exchanges().is_empty());
    assert_eq!(core.draft(), "How much exercise do I need?");
    assert_eq!(core.notice().as_deref(), Some("Server error: 503 Service Unavailable"));

    // The restored draft is sent again unchanged
    let id = core.send().unwrap();
    assert_eq!(core.notice(), None);
    assert_eq!(core.drive().await, Some(Applied::Settled(id)));

    let exchange = &core.exchanges()[0];
    assert_eq!(exchange.status, ExchangeStatus::Settled);
    assert_eq!(exchange.assistant.text(), Some("Aim for 150 minutes a week."));
    assert_eq!(backend.seen().len(), 2);
}

#[tokio::test]
async fn test_conversation_history_accumulates() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .then(serde_json::json!({"response": "Hello! How can I help?"}))
            .then(serde_json::json!({"response": "Try oatmeal."}))
            .then(serde_json::json!({"response": "Yes, with berries."})),
    );
    let (mut core, _) = assistant(backend.clone(), Arc::new(FixedSpeech("")));

    for message in ["Hi", "Breakfast idea?", "Is it good for glucose?"] {
        core.send_message(message).unwrap();
        core.drive().await;
    }

    let seen = backend.seen();
    let last = &seen[2].1;
    assert_eq!(seen[2].0, Endpoint::Chat);
    assert_eq!(
        last["history"],
        serde_json::json!([
            "User: Hi\nAssistant: Hello! How can I help?",
            "User: Breakfast idea?\nAssistant: Try oatmeal."
        ])
    );
    assert_eq!(last["user_message"], "Is it good for glucose?");
    assert_eq!(core.snapshot().exchanges.len(), 3);
    assert!(!core.snapshot().pending);
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out_and_rolls_back() {
    let backend = Arc::new(ScriptedBackend::default().then_after(
        Duration::from_secs(45),
        serde_json::json!({"response": "too late"}),
    ));
    let (mut core, _) = assistant(backend, Arc::new(FixedSpeech("")));

    core.send_message("Are eggs healthy?").unwrap();
    let applied = core.drive().await.unwrap();

    match applied {
        Applied::RolledBack { error, exchange } => {
            assert!(error.is_timeout());
            assert_eq!(exchange.status, ExchangeStatus::Failed);
        }
        other => panic!("expected timeout rollback, got {:?}", other),
    }
    assert_eq!(core.notice().as_deref(), Some("Request timed out. Please try again."));
    assert_eq!(core.draft(), "Are eggs healthy?");

    // Nothing settles later
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(core.exchanges().is_empty());
}

#[tokio::test]
async fn test_document_question_is_separate_from_chat() {
    let backend = Arc::new(ScriptedBackend::default().then(serde_json::json!({
        "response": "Your cholesterol was borderline high.",
        "context_used": "Lipid panel: LDL 158 mg/dL"
    })));
    let (mut core, _) = assistant(backend.clone(), Arc::new(FixedSpeech("")));

    let answer = core.ask_documents("What did my lipid panel show?").await.unwrap().clone();
    assert_eq!(answer.answer, "Your cholesterol was borderline high.");
    assert_eq!(answer.context, "Lipid panel: LDL 158 mg/dL");

    let seen = backend.seen();
    assert_eq!(seen[0].0, Endpoint::AskRag);
    assert_eq!(seen[0].1, serde_json::json!({"prompt": "What did my lipid panel show?"}));
    assert!(core.exchanges().is_empty());
    assert!(!core.is_pending());
}

#[tokio::test]
async fn test_crashing_backend_does_not_wedge_chat() {
    struct CrashOnce(Mutex<bool>);

    #[async_trait]
    impl Backend for CrashOnce {
        async fn send(&self, _endpoint: Endpoint, _payload: serde_json::Value) -> Result<serde_json::Value, RequestError> {
            let first = std::mem::replace(&mut *self.0.lock().unwrap(), false);
            if first {
                panic!("backend crashed");
            }
            Ok(serde_json::json!({"response": "Back online."}))
        }
    }

    let clipboard = MemoryClipboard::new();
    let mut core = AssistantCore::new(
        Arc::new(CrashOnce(Mutex::new(true))),
        Arc::new(FixedSpeech("")),
        Box::new(clipboard),
        &Config::default(),
    );

    core.send_message("Hello?").unwrap();
    assert!(matches!(core.drive().await, Some(Applied::RolledBack { .. })));
    assert!(!core.is_pending());
    assert_eq!(core.draft(), "Hello?");
    assert!(core.notice().is_some());

    let id = core.send().unwrap();
    assert_eq!(core.drive().await, Some(Applied::Settled(id)));
    assert_eq!(core.exchanges()[0].assistant.text(), Some("Back online."));
}

// =============================================================================
// Dictation and Clipboard Tests
// =============================================================================

#[tokio::test]
async fn test_dictation_then_send_then_copy() {
    let backend = Arc::new(ScriptedBackend::default().then(serde_json::json!({"response": "Drink water."})));
    let (mut core, clipboard) = assistant(backend.clone(), Arc::new(FixedSpeech("and dizzy")));

    core.set_draft("I feel tired");
    core.start_dictation().unwrap();
    let heard = core.dictate().await.unwrap().unwrap();
    assert_eq!(heard, "and dizzy");
    assert_eq!(core.draft(), "I feel tired and dizzy");

    let id = core.send().unwrap();
    core.drive().await;
    assert_eq!(backend.seen()[0].1["user_message"], "I feel tired and dizzy");

    assert!(core.copy_exchange(id).unwrap());
    assert_eq!(clipboard.contents().as_deref(), Some("Drink water."));
    assert!(core.is_copied(&exchange_copy_key(id)));
}

// =============================================================================
// Plan Tests
// =============================================================================

#[tokio::test]
async fn test_generated_plan_covers_seven_days() {
    let plan = (1..=7)
        .map(|day| format!("Day {}: Walk {} minutes.", day, day * 5))
        .collect::<Vec<_>>()
        .join("\n");
    let backend = Arc::new(ScriptedBackend::default().then(serde_json::json!({ "plan": plan })));
    let (mut core, _) = assistant(backend, Arc::new(FixedSpeech("")));

    let start = NaiveDate::from_ymd_opt(2024, 12, 28).unwrap();
    let vitals = Vitals {
        age: 60,
        bmi: 29.0,
        glucose: 105.0,
        blood_pressure: 135.0,
    };
    let calendar = core.generate_plan(vitals, start).await.unwrap();

    assert_eq!(calendar.len(), 7);
    assert_eq!(calendar.start_date(), start);
    assert_eq!(calendar.end_date(), NaiveDate::from_ymd_opt(2025, 1, 3));
    assert_eq!(
        calendar.get(&NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        Some("Day 5: Walk 25 minutes.")
    );
}
