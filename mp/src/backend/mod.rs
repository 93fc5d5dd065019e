//! Backend module for MedPrompt
//!
//! Typed request/response contracts and the transport that carries them.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod http;
mod types;

pub use client::Backend;
pub use http::HttpBackend;
pub use types::{
    ApiCall, AskRagRequest, AskRequest, ChatRequest, DailyTip, DailyTipRequest, DocumentAnswer, Endpoint,
    HealthTipsRequest, Method, NO_RESPONSE, PlanReply, PlanRequest, RagReply, TextReply, TipsReply, Vitals,
};

use crate::config::BackendConfig;
use crate::request::RequestError;

/// Create the HTTP backend described by the config
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>, RequestError> {
    debug!(base_url = %config.base_url, "create_backend: called");
    Ok(Arc::new(HttpBackend::from_config(config)?))
}
