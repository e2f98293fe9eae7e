//! Provider dispatch layer for Eizi.
//!
//! # Architecture
//!
//! - [`registry`] - closed enums for chat and voice providers, request shaping
//!   and response extraction
//! - [`transport::ChatTransport`] - relay (default) or direct delivery
//! - [`chat::ChatDispatcher`] - `send_chat_message`, normalized to [`ChatReply`](eizi_core::ChatReply)
//! - [`speech::SpeechDispatcher`] - `text_to_speech`, audio kept in an [`AudioBlobStore`]
//! - [`persona`] - coach system prompt, chat modes, conversation assembly

pub mod chat;
pub mod persona;
pub mod registry;
pub mod speech;
pub mod transport;

// Re-export main types for convenience
pub use chat::ChatDispatcher;
pub use persona::{build_conversation, system_prompt, ChatMode, HISTORY_WINDOW};
pub use registry::{ChatProvider, ProviderSpec, VoiceProvider, CHAT_PROVIDERS, VOICE_PROVIDERS};
pub use speech::{AudioBlob, AudioBlobStore, SpeechDispatcher};
pub use transport::{ChatTransport, DirectTransport, ProviderRequest, RelayTransport, TransportResponse};
