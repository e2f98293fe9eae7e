//! Error taxonomy for the dispatch layer.
//!
//! Every exit from chat or speech dispatch is either a value or one of these
//! variants - nothing propagates to the UI as a panic.

use thiserror::Error;

/// Failure of a chat or speech dispatch.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DispatchError {
    /// Missing or empty credential. Detected before any network I/O.
    #[error("{0}")]
    Configuration(String),

    /// Provider value not in the recognized set. Detected before any network I/O.
    #[error("{0}")]
    UnsupportedProvider(String),

    /// Non-2xx from the provider or the relay.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Network failure, unreadable body, relay unreachable, bad base64.
    #[error("{0}")]
    Transport(String),

    /// 2xx response lacking the field the active provider should have sent.
    #[error("{0}")]
    SchemaExtraction(String),
}

impl DispatchError {
    /// HTTP status carried by the error, if it came from upstream.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short category name, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Configuration(_) => "configuration",
            DispatchError::UnsupportedProvider(_) => "unsupported_provider",
            DispatchError::Upstream { .. } => "upstream",
            DispatchError::Transport(_) => "transport",
            DispatchError::SchemaExtraction(_) => "schema_extraction",
        }
    }
}

/// Result of a chat or speech dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_is_message_only() {
        let err = DispatchError::Upstream {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.kind(), "upstream");
    }

    #[test]
    fn test_non_upstream_has_no_status() {
        let err = DispatchError::Configuration("configure your API key".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "configure your API key");
    }
}
