//! Provider registry - static specs for the supported chat and voice providers.
//!
//! Each provider is a variant of a closed enum. Request shaping and response
//! extraction hang off the enum so call sites dispatch through a single `match`
//! rather than duplicating per-provider call logic.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use eizi_core::types::{ChatMessage, ChatOptions};

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// Chat providers
// ─────────────────────────────────────────────

/// Supported chat completion providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatProvider {
    OpenAi,
    Anthropic,
    Mistral,
    Perplexity,
}

/// Static metadata for one chat provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub provider: ChatProvider,
    /// Name used in the config file (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Base URL used by the direct transport when the config has no override.
    pub default_api_base: &'static str,
    /// Path appended to the base URL (or sent to the relay as `endpoint`).
    pub path: &'static str,
}

/// All chat providers, in display order.
pub static CHAT_PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        provider: ChatProvider::OpenAi,
        name: "openai",
        display_name: "OpenAI",
        default_api_base: "https://api.openai.com/v1",
        path: "/chat/completions",
    },
    ProviderSpec {
        provider: ChatProvider::Anthropic,
        name: "anthropic",
        display_name: "Anthropic",
        default_api_base: "https://api.anthropic.com/v1",
        path: "/messages",
    },
    ProviderSpec {
        provider: ChatProvider::Mistral,
        name: "mistral",
        display_name: "Mistral",
        default_api_base: "https://api.mistral.ai/v1",
        path: "/chat/completions",
    },
    ProviderSpec {
        provider: ChatProvider::Perplexity,
        name: "perplexity",
        display_name: "Perplexity",
        default_api_base: "https://api.perplexity.ai",
        path: "/chat/completions",
    },
];

/// Request body for OpenAI-compatible `/chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionsBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

/// Request body for Anthropic `/messages` (no temperature).
#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

impl ChatProvider {
    /// Look up a provider by its config name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        CHAT_PROVIDERS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name.trim()))
            .map(|spec| spec.provider)
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        // Every variant has exactly one entry in CHAT_PROVIDERS.
        match self {
            ChatProvider::OpenAi => &CHAT_PROVIDERS[0],
            ChatProvider::Anthropic => &CHAT_PROVIDERS[1],
            ChatProvider::Mistral => &CHAT_PROVIDERS[2],
            ChatProvider::Perplexity => &CHAT_PROVIDERS[3],
        }
    }

    pub fn path(&self) -> &'static str {
        self.spec().path
    }

    pub fn display_name(&self) -> &'static str {
        self.spec().display_name
    }

    /// Build the provider-shaped JSON body.
    ///
    /// Messages are forwarded exactly as given, in order, including any
    /// leading system message.
    pub fn build_body(&self, model: &str, messages: &[ChatMessage], options: &ChatOptions) -> Value {
        let body = match self {
            ChatProvider::OpenAi | ChatProvider::Mistral | ChatProvider::Perplexity => {
                serde_json::to_value(CompletionsBody {
                    model,
                    messages,
                    temperature: options.temperature(),
                    max_tokens: options.max_tokens(),
                })
            }
            ChatProvider::Anthropic => serde_json::to_value(MessagesBody {
                model,
                messages,
                max_tokens: options.max_tokens(),
            }),
        };
        // Plain structs of strings and numbers always serialize.
        body.unwrap_or(Value::Null)
    }

    /// Pull the assistant text out of a 2xx response body.
    ///
    /// Returns `None` when the field is missing, not a string, or empty.
    pub fn extract_content(&self, body: &Value) -> Option<String> {
        let pointer = match self {
            ChatProvider::OpenAi | ChatProvider::Mistral | ChatProvider::Perplexity => {
                "/choices/0/message/content"
            }
            ChatProvider::Anthropic => "/content/0/text",
        };
        body.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Auth headers for calling the provider directly with a local key.
    pub fn auth_headers(&self, api_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match self {
            ChatProvider::Anthropic => {
                if let Ok(val) = HeaderValue::from_str(api_key) {
                    headers.insert("x-api-key", val);
                }
                headers.insert(
                    "anthropic-version",
                    HeaderValue::from_static(ANTHROPIC_VERSION),
                );
            }
            _ => {
                if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                    headers.insert(AUTHORIZATION, val);
                }
            }
        }
        headers
    }
}

/// Best-effort error message from a non-2xx body.
///
/// Tries `error.message`, then a string `error`, then top-level `message`.
pub fn extract_error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.get("message").and_then(Value::as_str))
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

// ─────────────────────────────────────────────
// Voice providers
// ─────────────────────────────────────────────

/// Supported speech synthesis providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceProvider {
    ElevenLabs,
    Google,
    Azure,
}

impl VoiceProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "elevenlabs" => Some(VoiceProvider::ElevenLabs),
            "google" => Some(VoiceProvider::Google),
            "azure" => Some(VoiceProvider::Azure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VoiceProvider::ElevenLabs => "elevenlabs",
            VoiceProvider::Google => "google",
            VoiceProvider::Azure => "azure",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VoiceProvider::ElevenLabs => "ElevenLabs",
            VoiceProvider::Google => "Google Cloud TTS",
            VoiceProvider::Azure => "Azure Speech",
        }
    }
}

/// All voice providers, in display order.
pub static VOICE_PROVIDERS: &[VoiceProvider] = &[
    VoiceProvider::ElevenLabs,
    VoiceProvider::Google,
    VoiceProvider::Azure,
];

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_name() {
        assert_eq!(ChatProvider::from_name("openai"), Some(ChatProvider::OpenAi));
        assert_eq!(ChatProvider::from_name("Anthropic"), Some(ChatProvider::Anthropic));
        assert_eq!(ChatProvider::from_name("mistral"), Some(ChatProvider::Mistral));
        assert_eq!(ChatProvider::from_name("perplexity"), Some(ChatProvider::Perplexity));
        assert_eq!(ChatProvider::from_name("unknown-provider"), None);
        assert_eq!(ChatProvider::from_name(""), None);
    }

    #[test]
    fn test_spec_matches_variant() {
        for spec in CHAT_PROVIDERS {
            assert_eq!(spec.provider.spec().name, spec.name);
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(ChatProvider::OpenAi.path(), "/chat/completions");
        assert_eq!(ChatProvider::Mistral.path(), "/chat/completions");
        assert_eq!(ChatProvider::Perplexity.path(), "/chat/completions");
        assert_eq!(ChatProvider::Anthropic.path(), "/messages");
    }

    #[test]
    fn test_completions_body_defaults() {
        let messages = vec![ChatMessage::system("be kind"), ChatMessage::user("hi")];
        let body = ChatProvider::Mistral.build_body("mistral-small", &messages, &ChatOptions::default());
        assert_eq!(
            body,
            json!({
                "model": "mistral-small",
                "messages": [
                    {"role": "system", "content": "be kind"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.7,
                "max_tokens": 1000
            })
        );
    }

    #[test]
    fn test_anthropic_body_has_no_temperature() {
        let messages = vec![ChatMessage::user("hi")];
        let options = ChatOptions {
            temperature: Some(0.2),
            max_tokens: Some(256),
        };
        let body = ChatProvider::Anthropic.build_body("claude-3-haiku", &messages, &options);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["model"], "claude-3-haiku");
    }

    #[test]
    fn test_extract_openai_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]});
        assert_eq!(ChatProvider::OpenAi.extract_content(&body).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_extract_anthropic_content() {
        let body = json!({"content": [{"type": "text", "text": "Hi there"}]});
        assert_eq!(
            ChatProvider::Anthropic.extract_content(&body).as_deref(),
            Some("Hi there")
        );
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert!(ChatProvider::OpenAi.extract_content(&json!({"choices": []})).is_none());
        assert!(ChatProvider::Anthropic
            .extract_content(&json!({"content": [{"text": ""}]}))
            .is_none());
        // Wrong schema for the active provider
        assert!(ChatProvider::Anthropic
            .extract_content(&json!({"choices": [{"message": {"content": "x"}}]}))
            .is_none());
    }

    #[test]
    fn test_auth_headers() {
        let bearer = ChatProvider::OpenAi.auth_headers("sk-test");
        assert_eq!(bearer.get(AUTHORIZATION).unwrap(), "Bearer sk-test");

        let anthropic = ChatProvider::Anthropic.auth_headers("sk-ant");
        assert_eq!(anthropic.get("x-api-key").unwrap(), "sk-ant");
        assert_eq!(anthropic.get("anthropic-version").unwrap(), ANTHROPIC_VERSION);
        assert!(anthropic.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(&json!({"error": {"message": "rate limited"}})).as_deref(),
            Some("rate limited")
        );
        assert_eq!(
            extract_error_message(&json!({"error": "Internal server error"})).as_deref(),
            Some("Internal server error")
        );
        assert_eq!(
            extract_error_message(&json!({"message": "bad gateway"})).as_deref(),
            Some("bad gateway")
        );
        assert!(extract_error_message(&json!({"detail": "?"})).is_none());
        assert!(extract_error_message(&Value::Null).is_none());
    }

    #[test]
    fn test_voice_from_name() {
        assert_eq!(VoiceProvider::from_name("elevenlabs"), Some(VoiceProvider::ElevenLabs));
        assert_eq!(VoiceProvider::from_name("GOOGLE"), Some(VoiceProvider::Google));
        assert_eq!(VoiceProvider::from_name("azure"), Some(VoiceProvider::Azure));
        assert_eq!(VoiceProvider::from_name("polly"), None);
        for provider in VOICE_PROVIDERS {
            assert_eq!(VoiceProvider::from_name(provider.name()), Some(*provider));
        }
    }
}
