//! Request lifecycle: timed, abortable, single-settlement backend calls

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::RequestError;
use crate::backend::{ApiCall, Backend, Endpoint};

/// Deadline applied when a caller does not pass one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One outbound call, owned by its task until it settles or is aborted
struct RequestAttempt {
    target: Endpoint,
    payload: serde_json::Value,
    timeout: Duration,
    abort: CancellationToken,
}

/// Issues backend calls and guarantees at most one settlement per call
///
/// Each call races the backend against its deadline and its abort token.
/// A timeout drops the backend future (aborting the transport) and settles
/// with [`RequestError::Timeout`]. An abort settles with nothing at all.
#[derive(Clone)]
pub struct RequestLifecycleManager {
    backend: Arc<dyn Backend>,
    default_timeout: Duration,
}

impl RequestLifecycleManager {
    pub fn new(backend: Arc<dyn Backend>, default_timeout: Duration) -> Self {
        debug!(?default_timeout, "RequestLifecycleManager::new: called");
        Self {
            backend,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Start a call and return a handle to its eventual settlement
    ///
    /// Must be called from within a Tokio runtime.
    pub fn issue<C: ApiCall>(&self, call: C, timeout: Duration) -> RequestHandle<C::Reply> {
        let target = call.endpoint();
        debug!(%target, ?timeout, "issue: called");

        let (tx, rx) = oneshot::channel();
        let abort = CancellationToken::new();
        let handle = RequestHandle {
            target,
            outcome: rx,
            abort: abort.clone(),
            done: false,
            _guard: abort.clone().drop_guard(),
        };

        let payload = match serde_json::to_value(&call) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%target, error = %e, "issue: payload encoding failed");
                let _ = tx.send(Err(e.into()));
                return handle;
            }
        };

        let attempt = RequestAttempt {
            target,
            payload,
            timeout,
            abort,
        };
        let backend = self.backend.clone();
        tokio::spawn(run_attempt::<C::Reply>(backend, attempt, tx));

        handle
    }

    /// Issue with the default deadline and wait for the result
    pub async fn execute<C: ApiCall>(&self, call: C) -> Result<C::Reply, RequestError> {
        let mut handle = self.issue(call, self.default_timeout);
        match handle.wait().await {
            Some(result) => result,
            None => Err(RequestError::InvalidResponse("request was cancelled".to_string())),
        }
    }
}

async fn run_attempt<R: DeserializeOwned>(
    backend: Arc<dyn Backend>,
    attempt: RequestAttempt,
    tx: oneshot::Sender<Result<R, RequestError>>,
) {
    let RequestAttempt {
        target,
        payload,
        timeout,
        abort,
    } = attempt;

    let raced = tokio::select! {
        biased;
        _ = abort.cancelled() => {
            debug!(%target, "run_attempt: aborted before completion");
            return;
        }
        raced = tokio::time::timeout(timeout, backend.send(target, payload)) => raced,
    };

    let settled = match raced {
        Err(_) => {
            info!(%target, ?timeout, "run_attempt: deadline elapsed, call aborted");
            Err(RequestError::Timeout(timeout))
        }
        Ok(Err(e)) => {
            debug!(%target, error = %e, "run_attempt: backend failure");
            Err(e)
        }
        Ok(Ok(body)) => decode_reply(body),
    };

    if abort.is_cancelled() {
        debug!(%target, "run_attempt: aborted at completion, dropping settlement");
        return;
    }
    let _ = tx.send(settled);
}

/// Decode a reply body, surfacing an `error` field as an application error
///
/// Empty values (`null`, `""`, `false`, `0`) mean no error.
fn decode_reply<R: DeserializeOwned>(body: serde_json::Value) -> Result<R, RequestError> {
    use serde_json::Value;

    match body.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(Value::String(message)) if message.is_empty() => {}
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {}
        Some(Value::String(message)) => return Err(RequestError::ApplicationError(message.clone())),
        Some(other) => return Err(RequestError::ApplicationError(other.to_string())),
    }

    serde_json::from_value(body).map_err(|e| RequestError::InvalidResponse(e.to_string()))
}

/// Handle to one in-flight call
///
/// Dropping the handle aborts the call.
pub struct RequestHandle<T> {
    target: Endpoint,
    outcome: oneshot::Receiver<Result<T, RequestError>>,
    abort: CancellationToken,
    done: bool,
    _guard: DropGuard,
}

impl<T> RequestHandle<T> {
    pub fn target(&self) -> Endpoint {
        self.target
    }

    /// Abort the call; no settlement will be delivered afterwards
    pub fn abort(&self) {
        debug!(endpoint = %self.target, "RequestHandle::abort: called");
        self.abort.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }

    /// Wait for the settlement
    ///
    /// Returns `None` if the call was aborted or already settled. A call
    /// whose task died without settling fails with `NetworkUnavailable`.
    /// Cancel-safe: dropping this future before it resolves loses nothing.
    pub async fn wait(&mut self) -> Option<Result<T, RequestError>> {
        if self.done || self.abort.is_cancelled() {
            return None;
        }

        let received = (&mut self.outcome).await;
        self.done = true;

        if self.abort.is_cancelled() {
            return None;
        }
        match received {
            Ok(settled) => Some(settled),
            Err(_) => {
                warn!(endpoint = %self.target, "wait: request task ended without settling");
                Some(Err(RequestError::NetworkUnavailable("request task ended".to_string())))
            }
        }
    }
}
