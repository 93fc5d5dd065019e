//! Backend trait definition

use async_trait::async_trait;
#[allow(unused_imports)]
use tracing::debug;

use super::Endpoint;
use crate::request::RequestError;

/// Transport to the inference backend
///
/// Implementations move a JSON payload to an endpoint and hand back the
/// decoded JSON body. Transport failures and non-2xx statuses are classified
/// here; timeouts, abort and reply decoding belong to the lifecycle manager.
/// Dropping the returned future must abort the call.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, endpoint: Endpoint, payload: serde_json::Value) -> Result<serde_json::Value, RequestError>;
}
