//! Core types for Eizi - chat messages, dispatch options, and normalized results.
//!
//! Every chat provider speaks a slightly different dialect; these types are the
//! single internal shape the dispatch layer normalizes into.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Speaker of a chat message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat turn. Serializes to the `{ "role": ..., "content": ... }`
/// shape that both OpenAI-compatible and Anthropic APIs accept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Dispatch inputs / outputs
// ─────────────────────────────────────────────

/// Sampling temperature used when the caller doesn't supply one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Token cap used when the caller doesn't supply one.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Per-call options for a chat dispatch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature. `None` → [`DEFAULT_TEMPERATURE`].
    pub temperature: Option<f64>,
    /// Maximum tokens to generate. `None` → [`DEFAULT_MAX_TOKENS`].
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Successful chat dispatch: the normalized assistant message plus the
/// untouched provider payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub message: ChatMessage,
    pub raw_response: serde_json::Value,
}

/// Successful speech dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechClip {
    /// Object URL under which the audio bytes are registered (`blob:eizi/<id>`).
    pub audio_url: String,
    /// MIME type of the audio payload.
    pub mime_type: String,
    /// Decoded audio length in bytes.
    pub byte_len: usize,
    /// Providers don't report duration; always `0.0`.
    pub duration_secs: f64,
}

/// Request envelope the client sends to the relay endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RelayRequest {
    /// Upstream path appended to the relay's base URL (e.g. `/chat/completions`).
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
