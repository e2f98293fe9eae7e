//! Chat transports - how a provider-shaped request leaves the client.
//!
//! - [`RelayTransport`] wraps the body in a [`RelayRequest`] and POSTs it to
//!   the relay endpoint. No credential is attached.
//! - [`DirectTransport`] calls the provider with the locally stored key.
//!
//! Both report the upstream status and parsed JSON body; deciding whether
//! that is a success is left to the dispatcher.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use eizi_core::config::Config;
use eizi_core::error::{DispatchError, DispatchResult};
use eizi_core::types::RelayRequest;

use crate::registry::ChatProvider;

/// A provider-shaped chat request, ready for a transport.
#[derive(Clone, Debug)]
pub struct ProviderRequest {
    pub provider: ChatProvider,
    /// Provider path (e.g. `/chat/completions`).
    pub path: &'static str,
    pub body: Value,
}

/// Status and body as received from upstream.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body, or `Value::Null` when a non-2xx body was not JSON.
    pub body: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a [`ProviderRequest`] and returns the raw upstream answer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request. `config` is the snapshot the dispatcher read for
    /// this call.
    async fn send(
        &self,
        config: &Config,
        request: &ProviderRequest,
    ) -> DispatchResult<TransportResponse>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Read a response into a [`TransportResponse`].
///
/// A 2xx body that is not JSON is a transport failure. A non-2xx body that
/// is not JSON keeps its status with a null body.
async fn read_response(response: reqwest::Response) -> DispatchResult<TransportResponse> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| DispatchError::Transport(format!("Failed to read response: {}", e)))?;

    match serde_json::from_str::<Value>(&text) {
        Ok(body) => Ok(TransportResponse { status, body }),
        Err(e) if (200..300).contains(&status) => Err(DispatchError::Transport(format!(
            "Invalid JSON in response: {}",
            e
        ))),
        Err(_) => {
            debug!(status, "non-JSON error body");
            Ok(TransportResponse {
                status,
                body: Value::Null,
            })
        }
    }
}

// ─────────────────────────────────────────────
// Relay
// ─────────────────────────────────────────────

/// Sends requests through the relay endpoint.
pub struct RelayTransport {
    client: reqwest::Client,
}

impl RelayTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RelayTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for RelayTransport {
    async fn send(
        &self,
        config: &Config,
        request: &ProviderRequest,
    ) -> DispatchResult<TransportResponse> {
        let url = config.client.relay_endpoint();
        let envelope = RelayRequest {
            endpoint: request.path.to_string(),
            method: Some("POST".to_string()),
            body: Some(request.body.clone()),
        };

        debug!(url = %url, endpoint = request.path, "relay request");

        let response = self
            .client
            .post(&url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "relay unreachable");
                DispatchError::Transport(e.to_string())
            })?;

        read_response(response).await
    }

    fn name(&self) -> &str {
        "relay"
    }
}

// ─────────────────────────────────────────────
// Direct
// ─────────────────────────────────────────────

/// Calls providers directly with the locally configured key.
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DirectTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for DirectTransport {
    async fn send(
        &self,
        config: &Config,
        request: &ProviderRequest,
    ) -> DispatchResult<TransportResponse> {
        let chat = &config.chat_ai;
        let base = chat
            .api_base
            .as_deref()
            .unwrap_or(request.provider.spec().default_api_base);
        let url = format!("{}{}", base.trim_end_matches('/'), request.path);

        debug!(
            provider = request.provider.display_name(),
            url = %url,
            "direct request"
        );

        let response = self
            .client
            .post(&url)
            .headers(request.provider.auth_headers(&chat.api_key))
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                warn!(provider = request.provider.display_name(), error = %e, "provider unreachable");
                DispatchError::Transport(e.to_string())
            })?;

        read_response(response).await
    }

    fn name(&self) -> &str {
        "direct"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(provider: ChatProvider) -> ProviderRequest {
        ProviderRequest {
            provider,
            path: provider.path(),
            body: json!({"model": "m", "messages": []}),
        }
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.client.relay_url = server.uri();
        config.chat_ai.api_key = "sk-local".into();
        config.chat_ai.api_base = Some(server.uri());
        config
    }

    #[tokio::test]
    async fn test_relay_wraps_body_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proxy"))
            .and(body_json(json!({
                "endpoint": "/chat/completions",
                "method": "POST",
                "body": {"model": "m", "messages": []}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let response = RelayTransport::new()
            .send(&config_for(&server), &request(ChatProvider::OpenAi))
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_relay_sends_no_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proxy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        RelayTransport::new()
            .send(&config_for(&server), &request(ChatProvider::OpenAi))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("authorization").is_none());
        assert!(received[0].headers.get("x-api-key").is_none());
        let raw = String::from_utf8_lossy(&received[0].body);
        assert!(!raw.contains("sk-local"));
    }

    #[tokio::test]
    async fn test_direct_uses_bearer_and_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = DirectTransport::new()
            .send(&config_for(&server), &request(ChatProvider::Perplexity))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_direct_anthropic_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-local"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        DirectTransport::new()
            .send(&config_for(&server), &request(ChatProvider::Anthropic))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let response = RelayTransport::new()
            .send(&config_for(&server), &request(ChatProvider::OpenAi))
            .await
            .unwrap();
        assert_eq!(response.status, 502);
        assert!(response.body.is_null());
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = RelayTransport::new()
            .send(&config_for(&server), &request(ChatProvider::OpenAi))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let mut config = Config::default();
        // Nothing listens on port 9 (discard) on the loopback interface.
        config.client.relay_url = "http://127.0.0.1:9".into();

        let err = RelayTransport::new()
            .send(&config, &request(ChatProvider::OpenAi))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
