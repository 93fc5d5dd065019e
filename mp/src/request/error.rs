//! Request error types

use std::time::Duration;
use thiserror::Error;

/// Classified failure of one outbound backend call
///
/// The `Display` text is what the user sees in the notice banner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request timed out. Please try again.")]
    Timeout(Duration),

    #[error("Cannot connect to AI service. Please check if the server is running.")]
    NetworkUnavailable(String),

    #[error("Server error: {}", status_line(.status))]
    ServerError { status: u16 },

    #[error("{0}")]
    ApplicationError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(String),
}

impl RequestError {
    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout(_))
    }

    /// Check if retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Timeout(_) => true,
            RequestError::NetworkUnavailable(_) => true,
            RequestError::ServerError { status } => *status >= 500,
            RequestError::ApplicationError(_) => false,
            RequestError::InvalidResponse(_) => false,
            RequestError::Json(_) => false,
        }
    }

    /// HTTP status code, when the backend answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::ServerError { status } => Some(*status),
            _ => None,
        }
    }
}

/// Status code with its reason phrase ("500 Internal Server Error")
fn status_line(status: &u16) -> String {
    match reqwest::StatusCode::from_u16(*status).ok().and_then(|s| s.canonical_reason()) {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(RequestError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(RequestError::NetworkUnavailable("refused".to_string()).is_retryable());

        // 5xx errors should be retryable
        assert!(RequestError::ServerError { status: 502 }.is_retryable());

        // 4xx errors should not be retryable
        assert!(!RequestError::ServerError { status: 400 }.is_retryable());

        assert!(!RequestError::ApplicationError("quota exceeded".to_string()).is_retryable());
        assert!(!RequestError::InvalidResponse("missing field".to_string()).is_retryable());
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            RequestError::Timeout(Duration::from_secs(30)).to_string(),
            "Request timed out. Please try again."
        );
        assert_eq!(
            RequestError::NetworkUnavailable("refused".to_string()).to_string(),
            "Cannot connect to AI service. Please check if the server is running."
        );
        assert_eq!(
            RequestError::ServerError { status: 503 }.to_string(),
            "Server error: 503 Service Unavailable"
        );
        assert_eq!(
            RequestError::ServerError { status: 500 }.to_string(),
            "Server error: 500 Internal Server Error"
        );
        assert_eq!(RequestError::ServerError { status: 599 }.to_string(), "Server error: 599");
        assert_eq!(
            RequestError::ApplicationError("model overloaded".to_string()).to_string(),
            "model overloaded"
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(RequestError::ServerError { status: 500 }.status(), Some(500));
        assert_eq!(RequestError::Timeout(Duration::from_secs(1)).status(), None);
    }
}
