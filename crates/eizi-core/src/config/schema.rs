//! Configuration schema.
//!
//! Hierarchy: `Config` → `ChatAiConfig`, `VoiceAiConfig`, `ClientConfig`,
//! `RelayConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration - loaded from `~/.eizi/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub chat_ai: ChatAiConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_ai: Option<VoiceAiConfig>,
    pub client: ClientConfig,
    pub relay: RelayConfig,
}

// ─────────────────────────────────────────────
// Chat / voice providers
// ─────────────────────────────────────────────

/// Chat provider settings.
///
/// `provider` stays a plain string here so an unrecognized stored value
/// surfaces as a dispatch error instead of failing the whole config load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatAiConfig {
    /// One of `openai`, `anthropic`, `mistral`, `perplexity`.
    pub provider: String,
    /// Provider credential. Only used by the direct transport.
    pub api_key: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Default for ChatAiConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            api_base: None,
        }
    }
}

impl ChatAiConfig {
    /// Whether a credential has been entered.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Speech synthesis provider settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceAiConfig {
    /// One of `elevenlabs`, `google`, `azure`.
    pub provider: String,
    pub api_key: String,
    /// ElevenLabs voice id. Falls back to a stock voice when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Azure speech region (e.g. `westeurope`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for VoiceAiConfig {
    fn default() -> Self {
        Self {
            provider: "elevenlabs".to_string(),
            api_key: String::new(),
            voice_id: None,
            api_base: None,
            region: None,
        }
    }
}

impl VoiceAiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Client side
// ─────────────────────────────────────────────

/// How chat requests leave the client.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Through the relay endpoint; the provider key stays server-side.
    #[default]
    Relay,
    /// Straight to the provider with the locally stored key.
    Direct,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relay" => Ok(TransportMode::Relay),
            "direct" => Ok(TransportMode::Direct),
            other => Err(format!("unknown transport '{other}'")),
        }
    }
}

/// Client-side relay location and transport selection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL of the relay for this deployment (local vs. hosted).
    pub relay_url: String,
    /// Path of the relay endpoint on that host.
    pub relay_path: String,
    pub transport: TransportMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://localhost:3000".to_string(),
            relay_path: "/api/proxy".to_string(),
            transport: TransportMode::Relay,
        }
    }
}

impl ClientConfig {
    /// Full relay endpoint URL.
    pub fn relay_endpoint(&self) -> String {
        let base = self.relay_url.trim_end_matches('/');
        let path = self.relay_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

// ─────────────────────────────────────────────
// Relay (server side)
// ─────────────────────────────────────────────

/// Relay server settings. The credential lives here and nowhere on the client.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Route the relay listens on.
    pub path: String,
    /// Upstream provider base URL; the request's `endpoint` is appended to it.
    pub upstream_base: String,
    /// Server-held provider credential.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Optional `OpenAI-Organization` header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            path: "/api/proxy".to_string(),
            upstream_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            organization: None,
            allowed_origins: vec!["http://localhost:8080".to_string()],
        }
    }
}

impl RelayConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("upstream_base", &self.upstream_base)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("organization", &self.organization)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chat_ai.provider, "openai");
        assert_eq!(config.chat_ai.model, "gpt-3.5-turbo");
        assert!(!config.chat_ai.is_configured());
        assert!(config.voice_ai.is_none());
        assert_eq!(config.client.transport, TransportMode::Relay);
        assert_eq!(config.relay.port, 3000);
    }

    #[test]
    fn test_camel_case_roundtrip() {
        let json = r#"{
            "chatAi": { "provider": "anthropic", "apiKey": "sk-ant", "model": "claude-3-haiku" },
            "voiceAi": { "provider": "google", "apiKey": "g-key" },
            "client": { "relayUrl": "https://relay.example.com", "transport": "direct" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chat_ai.provider, "anthropic");
        assert!(config.chat_ai.is_configured());
        assert_eq!(config.voice_ai.as_ref().unwrap().provider, "google");
        assert_eq!(config.client.transport, TransportMode::Direct);
        // Unspecified field keeps its default
        assert_eq!(config.client.relay_path, "/api/proxy");
    }

    #[test]
    fn test_unknown_provider_string_still_loads() {
        let json = r#"{ "chatAi": { "provider": "unknown-provider", "apiKey": "k" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chat_ai.provider, "unknown-provider");
    }

    #[test]
    fn test_relay_endpoint_joins_slashes() {
        let client = ClientConfig {
            relay_url: "http://localhost:3000/".into(),
            relay_path: "/api/proxy".into(),
            ..Default::default()
        };
        assert_eq!(client.relay_endpoint(), "http://localhost:3000/api/proxy");
    }

    #[test]
    fn test_transport_mode_from_str() {
        assert_eq!("relay".parse::<TransportMode>(), Ok(TransportMode::Relay));
        assert_eq!("DIRECT".parse::<TransportMode>(), Ok(TransportMode::Direct));
        assert!("carrier-pigeon".parse::<TransportMode>().is_err());
    }

    #[test]
    fn test_relay_debug_hides_key() {
        let relay = RelayConfig {
            api_key: "sk-secret".into(),
            ..Default::default()
        };
        let dbg = format!("{:?}", relay);
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn test_relay_key_not_serialized_when_empty() {
        let raw = serde_json::to_value(RelayConfig::default()).unwrap();
        assert!(raw.get("apiKey").is_none());
        assert!(raw.get("upstreamBase").is_some());
    }
}
