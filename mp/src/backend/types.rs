//! Request and reply contracts for the inference backend

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Reply text used when the backend answers without one
pub const NO_RESPONSE: &str = "No response received";

/// Logical backend endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Ask,
    AskRag,
    Chat,
    GeneratePlan,
    GenerateHealthTips,
    DailyTip,
}

/// HTTP method used for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Endpoint {
    /// Path relative to the backend base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Ask => "/openrouter/ask",
            Endpoint::AskRag => "/openrouter/ask-rag",
            Endpoint::Chat => "/openrouter/chat",
            Endpoint::GeneratePlan => "/openrouter/generate-plan",
            Endpoint::GenerateHealthTips => "/openrouter/generate-health-tips",
            Endpoint::DailyTip => "/api/tips/daily",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::DailyTip => Method::Get,
            _ => Method::Post,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Ask => "ask",
            Endpoint::AskRag => "ask-rag",
            Endpoint::Chat => "chat",
            Endpoint::GeneratePlan => "generate-plan",
            Endpoint::GenerateHealthTips => "generate-health-tips",
            Endpoint::DailyTip => "daily-tip",
        };
        write!(f, "{}", name)
    }
}

/// A typed backend call: the payload, where it goes, and what comes back
pub trait ApiCall: Serialize + Send {
    type Reply: DeserializeOwned + Send + 'static;

    fn endpoint(&self) -> Endpoint;
}

/// One-shot question
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub prompt: String,
}

/// Question answered from the indexed medical documents
#[derive(Debug, Clone, Serialize)]
pub struct AskRagRequest {
    pub prompt: String,
}

/// Chat turn with the formatted conversation so far
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub history: Vec<String>,
    pub user_message: String,
}

/// Vital signs used by plan and tips generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub age: u32,
    pub bmi: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
}

/// Seven-day plan generation
#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub vitals: Vitals,
}

/// Personalised lifestyle tips
#[derive(Debug, Clone, Serialize)]
pub struct HealthTipsRequest {
    #[serde(flatten)]
    pub vitals: Vitals,
    pub risk_score: f64,
}

/// Tip of the day (no payload)
#[derive(Debug, Clone, Serialize)]
pub struct DailyTipRequest;

/// Text reply from `ask` and `chat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextReply {
    #[serde(default)]
    pub response: Option<String>,
}

impl TextReply {
    /// Reply text, falling back when the backend sent none
    pub fn into_text(self) -> String {
        match self.response {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_RESPONSE.to_string(),
        }
    }
}

/// Document answer plus the excerpts it was based on
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RagReply {
    #[serde(default)]
    pub response: Option<String>,

    #[serde(default)]
    pub context_used: Option<String>,
}

impl RagReply {
    pub fn into_answer(self) -> DocumentAnswer {
        DocumentAnswer {
            answer: TextReply {
                response: self.response,
            }
            .into_text(),
            context: self.context_used.unwrap_or_default(),
        }
    }
}

/// Answer from the document search, with the context it used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAnswer {
    pub answer: String,
    pub context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanReply {
    pub plan: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TipsReply {
    pub tips: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyTip {
    pub tip: String,
    pub source: String,
}

impl DailyTip {
    /// Shown when the tip service cannot be reached
    pub fn fallback() -> Self {
        Self {
            tip: "Stay hydrated and take regular breaks.".to_string(),
            source: "Fallback".to_string(),
        }
    }
}

impl ApiCall for AskRequest {
    type Reply = TextReply;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Ask
    }
}

impl ApiCall for AskRagRequest {
    type Reply = RagReply;

    fn endpoint(&self) -> Endpoint {
        Endpoint::AskRag
    }
}

impl ApiCall for ChatRequest {
    type Reply = TextReply;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Chat
    }
}

impl ApiCall for PlanRequest {
    type Reply = PlanReply;

    fn endpoint(&self) -> Endpoint {
        Endpoint::GeneratePlan
    }
}

impl ApiCall for HealthTipsRequest {
    type Reply = TipsReply;

    fn endpoint(&self) -> Endpoint {
        Endpoint::GenerateHealthTips
    }
}

impl ApiCall for DailyTipRequest {
    type Reply = DailyTip;

    fn endpoint(&self) -> Endpoint {
        Endpoint::DailyTip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_request_flattens_vitals() {
        let req = PlanRequest {
            vitals: Vitals {
                age: 45,
                bmi: 27.5,
                glucose: 130.0,
                blood_pressure: 85.0,
            },
        };

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["age"], 45);
        assert_eq!(body["bmi"], 27.5);
        assert_eq!(body["glucose"], 130.0);
        assert_eq!(body["blood_pressure"], 85.0);
        assert!(body.get("vitals").is_none());
    }

    #[test]
    fn test_chat_request_shape() {
        let req = ChatRequest {
            history: vec!["User: hi\nAssistant: hello".to_string()],
            user_message: "how are you".to_string(),
        };

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["history"][0], "User: hi\nAssistant: hello");
        assert_eq!(body["user_message"], "how are you");
    }

    #[test]
    fn test_text_reply_fallback() {
        let reply: TextReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.into_text(), NO_RESPONSE);

        let reply: TextReply = serde_json::from_str(r#"{"response": "  "}"#).unwrap();
        assert_eq!(reply.into_text(), NO_RESPONSE);

        let reply: TextReply = serde_json::from_str(r#"{"response": "Drink water"}"#).unwrap();
        assert_eq!(reply.into_text(), "Drink water");
    }

    #[test]
    fn test_rag_reply_keeps_context() {
        let reply: RagReply = serde_json::from_str(
            r#"{"response": "Your A1C was 6.1", "context_used": "Lab report: A1C 6.1%"}"#,
        )
        .unwrap();
        let answer = reply.into_answer();
        assert_eq!(answer.answer, "Your A1C was 6.1");
        assert_eq!(answer.context, "Lab report: A1C 6.1%");

        let answer = serde_json::from_str::<RagReply>("{}").unwrap().into_answer();
        assert_eq!(answer.answer, NO_RESPONSE);
        assert_eq!(answer.context, "");
    }

    #[test]
    fn test_endpoint_routes() {
        assert_eq!(Endpoint::Chat.path(), "/openrouter/chat");
        assert_eq!(Endpoint::Chat.method(), Method::Post);
        assert_eq!(Endpoint::DailyTip.method(), Method::Get);
        assert_eq!(Endpoint::GeneratePlan.to_string(), "generate-plan");
        assert_eq!(Endpoint::AskRag.path(), "/openrouter/ask-rag");
        assert_eq!(Endpoint::AskRag.method(), Method::Post);
    }
}
