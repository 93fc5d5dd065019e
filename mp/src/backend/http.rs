//! HTTP backend implementation
//!
//! Talks JSON to the MedPrompt API server. Every endpoint takes a JSON body
//! (POST) except the daily tip (GET). Status and transport failures are
//! classified into [`RequestError`].

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{Backend, Endpoint, Method};
use crate::config::BackendConfig;
use crate::request::RequestError;

/// HTTP client for the MedPrompt API
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    /// Create a new backend from configuration
    ///
    /// No client-level timeout is set: deadlines are enforced per call by the
    /// lifecycle manager so that a timeout can abort the call.
    pub fn from_config(config: &BackendConfig) -> Result<Self, RequestError> {
        debug!(?config, "from_config: called");
        let http = Client::builder()
            .build()
            .map_err(|e| RequestError::NetworkUnavailable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, endpoint: Endpoint, payload: serde_json::Value) -> Result<serde_json::Value, RequestError> {
        let url = self.url(endpoint);
        debug!(%endpoint, %url, "send: called");

        let request = match endpoint.method() {
            Method::Get => self.http.get(&url),
            Method::Post => self
                .http
                .post(&url)
                .header("content-type", "application/json")
                .json(&payload),
        };

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(%endpoint, error = %e, "send: transport error");
                return Err(RequestError::NetworkUnavailable(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%endpoint, status = status.as_u16(), "send: server error");
            return Err(RequestError::ServerError {
                status: status.as_u16(),
            });
        }

        debug!(%endpoint, "send: success");
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| RequestError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response and return the base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + content_length
    }

    fn backend(base_url: String) -> HttpBackend {
        HttpBackend::from_config(&BackendConfig {
            base_url,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let base = serve_once("200 OK", r#"{"response": "Eat more greens"}"#).await;
        let body = backend(base)
            .send(Endpoint::Ask, serde_json::json!({"prompt": "diet?"}))
            .await
            .unwrap();
        assert_eq!(body["response"], "Eat more greens");
    }

    #[tokio::test]
    async fn test_non_success_is_server_error() {
        let base = serve_once("503 Service Unavailable", r#"{"detail": "down"}"#).await;
        let err = backend(base)
            .send(Endpoint::Chat, serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::ServerError { status: 503 });
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let base = serve_once("200 OK", "not json").await;
        let err = backend(base)
            .send(Endpoint::GeneratePlan, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_unavailable() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(format!("http://{}", addr))
            .send(Endpoint::Ask, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::NetworkUnavailable(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = backend("http://localhost:8000/".to_string());
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url(Endpoint::DailyTip), "http://localhost:8000/api/tips/daily");
    }
}
