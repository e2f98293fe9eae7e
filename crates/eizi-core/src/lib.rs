//! Eizi core - shared types, dispatch error taxonomy, configuration, and the
//! local journal store.

pub mod config;
pub mod error;
pub mod journal;
pub mod types;
pub mod utils;

pub use error::{DispatchError, DispatchResult};
pub use types::{ChatMessage, ChatOptions, ChatReply, RelayRequest, Role, SpeechClip};
