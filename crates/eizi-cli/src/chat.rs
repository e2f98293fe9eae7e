//! A chat session: persona prompt, journal persistence, and the fallback reply.

use anyhow::Result;
use tracing::warn;

use eizi_core::error::DispatchError;
use eizi_core::journal::{JournalMessage, JournalStore, Sender};
use eizi_core::types::ChatOptions;
use eizi_providers::{build_conversation, ChatDispatcher, ChatMode, HISTORY_WINDOW};

/// Shown in place of a reply whenever dispatch fails.
pub const FALLBACK_REPLY: &str = "I'm having trouble connecting to my AI services. Please check your API settings or try again later.";

/// Outcome of one user turn.
#[derive(Debug)]
pub struct ChatTurn {
    /// Text to show as Eizi's reply (the fallback on failure).
    pub reply: String,
    /// The dispatch failure, if any.
    pub error: Option<DispatchError>,
}

pub struct ChatSession {
    dispatcher: ChatDispatcher,
    journal: JournalStore,
    mode: ChatMode,
    persist: bool,
}

impl ChatSession {
    pub fn new(dispatcher: ChatDispatcher, journal: JournalStore, mode: ChatMode, persist: bool) -> Self {
        Self {
            dispatcher,
            journal,
            mode,
            persist,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    pub fn journal(&self) -> &JournalStore {
        &self.journal
    }

    /// Send one user message and return what Eizi says back.
    ///
    /// A failed dispatch still produces a turn (the fallback reply) so the
    /// conversation stays usable; only journal I/O errors are returned.
    pub async fn ask(&self, input: &str) -> Result<ChatTurn> {
        let history = self.journal.messages();
        let context = self.journal.memory_context();
        let messages = build_conversation(self.mode, &history, input, HISTORY_WINDOW, Some(&context));

        if self.persist {
            self.journal
                .append_message(JournalMessage::new(Sender::User, input))?;
        }

        let turn = match self
            .dispatcher
            .send_chat_message(&messages, &ChatOptions::default())
            .await
        {
            Ok(reply) => ChatTurn {
                reply: reply.message.content,
                error: None,
            },
            Err(e) => {
                warn!(kind = e.kind(), status = ?e.status(), error = %e, "chat dispatch failed");
                ChatTurn {
                    reply: FALLBACK_REPLY.to_string(),
                    error: Some(e),
                }
            }
        };

        if self.persist {
            self.journal
                .append_message(JournalMessage::new(Sender::Eizi, turn.reply.clone()))?;
        }

        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eizi_core::config::{Config, StaticSettings};
    use std::sync::Arc;

    fn session(config: Config, persist: bool) -> (ChatSession, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalStore::new(Some(dir.path().to_path_buf())).unwrap();
        let dispatcher = ChatDispatcher::new(Arc::new(StaticSettings(config)));
        (ChatSession::new(dispatcher, journal, ChatMode::Normal, persist), dir)
    }

    #[tokio::test]
    async fn fallback_reply_when_key_missing() {
        let (session, _dir) = session(Config::default(), true);
        let turn = session.ask("hello").await.unwrap();

        assert_eq!(turn.reply, FALLBACK_REPLY);
        assert_eq!(turn.error.as_ref().map(|e| e.kind()), Some("configuration"));

        let saved = session.journal().messages();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].sender, Sender::User);
        assert_eq!(saved[0].content, "hello");
        assert_eq!(saved[1].sender, Sender::Eizi);
        assert_eq!(saved[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn fallback_reply_when_relay_unreachable() {
        let mut config = Config::default();
        config.chat_ai.api_key = "k".into();
        config.client.relay_url = "http://127.0.0.1:9".into();
        let (session, _dir) = session(config, false);

        let turn = session.ask("hello").await.unwrap();
        assert_eq!(turn.reply, FALLBACK_REPLY);
        assert_eq!(turn.error.as_ref().map(|e| e.kind()), Some("transport"));
        // Nothing persisted with --no-save
        assert!(session.journal().messages().is_empty());
    }

    #[test]
    fn mode_can_change_mid_session() {
        let (mut session, _dir) = session(Config::default(), false);
        assert_eq!(session.mode(), ChatMode::Normal);
        session.set_mode(ChatMode::LowBattery);
        assert_eq!(session.mode(), ChatMode::LowBattery);
    }
}
