//! The relay handler: credential injection and verbatim pass-through.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use eizi_core::config::RelayConfig;
use eizi_core::types::RelayRequest;

/// Shared, read-only relay state. Built once at startup.
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    upstream_base: String,
    api_key: String,
    organization: Option<String>,
}

impl RelayState {
    pub fn new(
        upstream_base: impl Into<String>,
        api_key: impl Into<String>,
        organization: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream_base: upstream_base.into(),
            api_key: api_key.into(),
            organization,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.upstream_base.clone(),
            config.api_key.clone(),
            config.organization.clone(),
        )
    }

    fn upstream_url(&self, endpoint: &str) -> String {
        let base = self.upstream_base.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("upstream_base", &self.upstream_base)
            .field("api_key", &"***")
            .field("organization", &self.organization)
            .finish()
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Why a forward could not produce an upstream answer.
#[derive(Debug, thiserror::Error)]
enum ForwardError {
    #[error("invalid method '{0}'")]
    BadMethod(String),

    #[error("upstream unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned non-JSON body (status {0})")]
    NotJson(u16),
}

/// Send `builder` and parse the upstream answer as JSON.
async fn send_json(builder: reqwest::RequestBuilder) -> Result<(u16, Value), ForwardError> {
    let response = builder.send().await.map_err(|e| e.without_url())?;
    let status = response.status().as_u16();
    let text = response.text().await.map_err(|e| e.without_url())?;
    let body = serde_json::from_str::<Value>(&text).map_err(|_| ForwardError::NotJson(status))?;
    Ok((status, body))
}

async fn forward(state: &RelayState, request: RelayRequest) -> Result<(u16, Value), ForwardError> {
    let method_name = request.method.as_deref().unwrap_or("POST").to_ascii_uppercase();
    let method = reqwest::Method::from_bytes(method_name.as_bytes())
        .map_err(|_| ForwardError::BadMethod(method_name.clone()))?;
    let url = state.upstream_url(&request.endpoint);

    debug!(method = %method, endpoint = %request.endpoint, "relaying request");

    let mut builder = state
        .client
        .request(method, &url)
        .bearer_auth(&state.api_key)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(org) = &state.organization {
        builder = builder.header("OpenAI-Organization", org);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    send_json(builder).await
}

/// Handler for the relay path.
///
/// - non-POST → 405 `{"error":"Method not allowed"}`
/// - malformed body, unreachable upstream, non-JSON upstream → 500
/// - upstream 2xx → 200 with the body verbatim
/// - upstream non-2xx → same status, body verbatim
pub async fn relay_handler(
    State(state): State<Arc<RelayState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        debug!(method = %method, "rejected non-POST relay call");
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "malformed relay request");
            return internal_error();
        }
    };
    let endpoint = request.endpoint.clone();

    match forward(&state, request).await {
        Ok((status, body)) if (200..300).contains(&status) => {
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok((status, body)) => {
            warn!(endpoint = %endpoint, status, "upstream returned error");
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (code, Json(body)).into_response()
        }
        Err(e) => {
            error!(endpoint = %endpoint, error = %e, "relay forward failed");
            internal_error()
        }
    }
}

/// `GET /api/limits` - upstream `/usage` with the relay credential.
///
/// Any JSON answer is returned with 200; a network failure or non-JSON body
/// is 500 `{"error":"Failed to fetch rate limits"}`.
pub async fn limits_handler(State(state): State<Arc<RelayState>>) -> Response {
    let builder = state
        .client
        .get(state.upstream_url("/usage"))
        .bearer_auth(&state.api_key);

    match send_json(builder).await {
        Ok((status, body)) => {
            debug!(status, "fetched usage");
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "usage fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch rate limits")
        }
    }
}

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RelayState {
        RelayState::new("http://127.0.0.1:9/v1/", "sk-hidden", None)
    }

    #[test]
    fn test_upstream_url_joins_slashes() {
        let s = state();
        assert_eq!(s.upstream_url("/chat/completions"), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(s.upstream_url("models"), "http://127.0.0.1:9/v1/models");
    }

    #[test]
    fn test_debug_masks_credential() {
        let shown = format!("{:?}", state());
        assert!(!shown.contains("sk-hidden"));
        assert!(shown.contains("***"));
    }

    #[tokio::test]
    async fn test_invalid_method_is_rejected_before_sending() {
        let request = RelayRequest {
            endpoint: "/chat/completions".into(),
            method: Some("GE T".into()),
            body: None,
        };
        let err = forward(&state(), request).await.unwrap_err();
        assert!(matches!(err, ForwardError::BadMethod(ref m) if m == "GE T"));
        assert_eq!(err.to_string(), "invalid method 'GE T'");
    }

    #[tokio::test]
    async fn test_network_error_converts_without_credential() {
        let request = RelayRequest {
            endpoint: "/chat/completions".into(),
            method: None,
            body: None,
        };
        let err = forward(&state(), request).await.unwrap_err();
        assert!(matches!(err, ForwardError::Network(_)));
        let shown = err.to_string();
        assert!(shown.starts_with("upstream unreachable: "));
        assert!(!shown.contains("sk-hidden"));
    }

    #[test]
    fn test_not_json_message() {
        assert_eq!(
            ForwardError::NotJson(502).to_string(),
            "upstream returned non-JSON body (status 502)"
        );
    }
}
