//! Chat dispatch - one call shape for every supported chat provider.
//!
//! Settings are re-read on each call, so a provider or key change takes
//! effect on the next message without rebuilding the dispatcher.

use std::sync::Arc;

use tracing::{debug, info, warn};

use eizi_core::config::{Config, SettingsSource, TransportMode};
use eizi_core::error::{DispatchError, DispatchResult};
use eizi_core::types::{ChatMessage, ChatOptions, ChatReply};

use crate::registry::{extract_error_message, ChatProvider};
use crate::transport::{ChatTransport, DirectTransport, ProviderRequest, RelayTransport};

pub const API_KEY_MISSING: &str = "API key not configured. Please add your API key in Settings.";
pub const UNKNOWN_PROVIDER: &str = "Unknown AI provider. Please check your settings.";
pub const NO_CONTENT: &str = "No content received from AI service";
pub const GENERIC_UPSTREAM: &str = "Failed to get response from AI service.";

enum Transports {
    /// Pick relay or direct from `client.transport` on each call.
    ByMode {
        relay: Arc<dyn ChatTransport>,
        direct: Arc<dyn ChatTransport>,
    },
    /// Always use the same transport.
    Fixed(Arc<dyn ChatTransport>),
}

/// Sends a conversation to whichever chat provider the settings name.
pub struct ChatDispatcher {
    settings: Arc<dyn SettingsSource>,
    transports: Transports,
}

impl ChatDispatcher {
    /// Dispatcher choosing relay or direct per the stored transport mode.
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            settings,
            transports: Transports::ByMode {
                relay: Arc::new(RelayTransport::new()),
                direct: Arc::new(DirectTransport::new()),
            },
        }
    }

    /// Dispatcher pinned to one transport, regardless of settings.
    pub fn with_transport(
        settings: Arc<dyn SettingsSource>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            settings,
            transports: Transports::Fixed(transport),
        }
    }

    fn transport_for(&self, config: &Config) -> &Arc<dyn ChatTransport> {
        match &self.transports {
            Transports::Fixed(transport) => transport,
            Transports::ByMode { relay, direct } => match config.client.transport {
                TransportMode::Relay => relay,
                TransportMode::Direct => direct,
            },
        }
    }

    /// Send `messages` to the configured provider and return the reply.
    ///
    /// Configuration and provider checks run before any network I/O.
    pub async fn send_chat_message(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> DispatchResult<ChatReply> {
        let config = self.settings.load();
        let chat = &config.chat_ai;

        if !chat.is_configured() {
            warn!("chat dispatch without API key");
            return Err(DispatchError::Configuration(API_KEY_MISSING.to_string()));
        }

        let provider = ChatProvider::from_name(&chat.provider).ok_or_else(|| {
            warn!(provider = %chat.provider, "unsupported chat provider");
            DispatchError::UnsupportedProvider(UNKNOWN_PROVIDER.to_string())
        })?;

        let request = ProviderRequest {
            provider,
            path: provider.path(),
            body: provider.build_body(&chat.model, messages, options),
        };
        let transport = self.transport_for(&config);

        debug!(
            provider = provider.display_name(),
            model = %chat.model,
            transport = transport.name(),
            messages = messages.len(),
            "dispatching chat"
        );

        let response = transport.send(&config, &request).await?;

        if !response.is_success() {
            let message = extract_error_message(&response.body)
                .unwrap_or_else(|| GENERIC_UPSTREAM.to_string());
            warn!(
                provider = provider.display_name(),
                status = response.status,
                error = %message,
                "chat request failed"
            );
            return Err(DispatchError::Upstream {
                status: response.status,
                message,
            });
        }

        let content = provider.extract_content(&response.body).ok_or_else(|| {
            warn!(provider = provider.display_name(), "reply missing content");
            DispatchError::SchemaExtraction(NO_CONTENT.to_string())
        })?;

        info!(
            provider = provider.display_name(),
            chars = content.chars().count(),
            "chat reply received"
        );

        Ok(ChatReply {
            message: ChatMessage::assistant(content),
            raw_response: response.body,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
