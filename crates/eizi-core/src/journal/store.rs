//! Journal persistence.
//!
//! Files under `~/.eizi/journal/`:
//! - `conversation.json` - array of [`JournalMessage`], oldest first
//! - `memory.json` - one [`UserMemory`] object (mood history, reminders, profile)
//!
//! Every operation re-reads the file it touches, so two handles on the same
//! directory never disagree.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::utils;

// ─────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────

/// Who wrote a journal message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Eizi,
}

/// A chat line as the journal keeps it (with id and timestamp).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JournalMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl JournalMessage {
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// One entry of the mood palette.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Mood {
    pub id: String,
    pub emoji: String,
    pub label: String,
    pub color: String,
}

/// A logged mood.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MoodEntry {
    pub fn new(mood: Mood, note: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mood,
            note,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub message: String,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

impl Reminder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            completed: false,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    Taglish,
}

/// Everything the journal remembers about the user.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMemory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub preferred_language: Language,
    /// Newest first.
    pub mood_history: Vec<MoodEntry>,
    /// Newest first.
    pub reminders: Vec<Reminder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<DateTime<Utc>>,
}

/// The fixed set of moods the picker offers.
pub fn mood_palette() -> Vec<Mood> {
    [
        ("1", "😊", "Happy", "yellow"),
        ("2", "😌", "Peaceful", "teal"),
        ("3", "😐", "Neutral", "blue"),
        ("4", "😔", "Sad", "purple"),
        ("5", "😡", "Angry", "red"),
        ("6", "😰", "Anxious", "green"),
    ]
    .into_iter()
    .map(|(id, emoji, label, color)| Mood {
        id: id.to_string(),
        emoji: emoji.to_string(),
        label: label.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Find a palette mood by label (case-insensitive) or id.
pub fn find_mood(key: &str) -> Option<Mood> {
    mood_palette()
        .into_iter()
        .find(|m| m.id == key || m.label.eq_ignore_ascii_case(key))
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no reminder with id '{0}'")]
    ReminderNotFound(String),

    #[error("reminder id '{prefix}' matches {count} reminders")]
    AmbiguousReminder { prefix: String, count: usize },
}

pub type JournalResult<T> = Result<T, JournalError>;

// ─────────────────────────────────────────────
// JournalStore
// ─────────────────────────────────────────────

const CONVERSATION_FILE: &str = "conversation.json";
const MEMORY_FILE: &str = "memory.json";

/// File-backed store for conversation history, moods, and reminders.
#[derive(Clone, Debug)]
pub struct JournalStore {
    dir: PathBuf,
}

impl JournalStore {
    /// Open a journal directory.
    ///
    /// `dir` defaults to `~/.eizi/journal/` if `None`.
    /// The directory is created if it doesn't exist.
    pub fn new(dir: Option<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.unwrap_or_else(utils::get_journal_path);
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Conversation ──

    /// All saved messages, oldest first.
    pub fn messages(&self) -> Vec<JournalMessage> {
        self.read_or_default(CONVERSATION_FILE)
    }

    /// Append one message and persist.
    pub fn append_message(&self, message: JournalMessage) -> JournalResult<()> {
        let mut messages = self.messages();
        messages.push(message);
        self.write(CONVERSATION_FILE, &messages)?;

        let mut memory = self.memory();
        memory.last_interaction = Some(Utc::now());
        self.write(MEMORY_FILE, &memory)
    }

    /// Remove the conversation file entirely.
    pub fn clear_messages(&self) -> JournalResult<()> {
        let path = self.dir.join(CONVERSATION_FILE);
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!("Cleared conversation at {}", path.display());
        }
        Ok(())
    }

    // ── Memory ──

    /// Current memory (defaults if nothing saved yet).
    pub fn memory(&self) -> UserMemory {
        self.read_or_default(MEMORY_FILE)
    }

    pub fn add_mood_entry(&self, entry: MoodEntry) -> JournalResult<()> {
        let mut memory = self.memory();
        memory.mood_history.insert(0, entry);
        self.write(MEMORY_FILE, &memory)
    }

    pub fn add_reminder(&self, reminder: Reminder) -> JournalResult<()> {
        let mut memory = self.memory();
        memory.reminders.insert(0, reminder);
        self.write(MEMORY_FILE, &memory)
    }

    /// Flip a reminder's completed flag. Returns the new state.
    ///
    /// `id` is a full id or a unique, non-empty prefix of one.
    pub fn toggle_reminder(&self, id: &str) -> JournalResult<bool> {
        if id.is_empty() {
            return Err(JournalError::ReminderNotFound(String::new()));
        }

        let mut memory = self.memory();
        let index = match memory.reminders.iter().position(|r| r.id == id) {
            Some(i) => i,
            None => {
                let matches: Vec<usize> = memory
                    .reminders
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.id.starts_with(id))
                    .map(|(i, _)| i)
                    .collect();
                match matches.as_slice() {
                    [] => return Err(JournalError::ReminderNotFound(id.to_string())),
                    [i] => *i,
                    _ => {
                        return Err(JournalError::AmbiguousReminder {
                            prefix: id.to_string(),
                            count: matches.len(),
                        })
                    }
                }
            }
        };

        let reminder = &mut memory.reminders[index];
        reminder.completed = !reminder.completed;
        let completed = reminder.completed;
        self.write(MEMORY_FILE, &memory)?;
        Ok(completed)
    }

    pub fn set_user_name(&self, name: impl Into<String>) -> JournalResult<()> {
        let mut memory = self.memory();
        memory.name = Some(name.into());
        self.write(MEMORY_FILE, &memory)
    }

    pub fn set_language(&self, language: Language) -> JournalResult<()> {
        let mut memory = self.memory();
        memory.preferred_language = language;
        self.write(MEMORY_FILE, &memory)
    }

    /// Plain-text summary of the user for the coach's system prompt.
    pub fn memory_context(&self) -> String {
        let memory = self.memory();
        let mut context = String::from("User Information:\n");

        if let Some(ref name) = memory.name {
            context.push_str(&format!("Name: {}\n", name));
        }
        context.push_str(&format!(
            "Preferred Language: {:?}\n\n",
            memory.preferred_language
        ));

        if !memory.mood_history.is_empty() {
            context.push_str("Recent Moods:\n");
            for entry in memory.mood_history.iter().take(5) {
                let date = entry.timestamp.format("%Y-%m-%d");
                match entry.note {
                    Some(ref note) => context.push_str(&format!(
                        "- {}: {} (Note: \"{}\")\n",
                        date, entry.mood.label, note
                    )),
                    None => context.push_str(&format!("- {}: {}\n", date, entry.mood.label)),
                }
            }
            context.push('\n');
        }

        let active: Vec<&Reminder> = memory.reminders.iter().filter(|r| !r.completed).collect();
        if !active.is_empty() {
            context.push_str("Active Reminders:\n");
            for reminder in active {
                context.push_str(&format!("- {}\n", reminder.message));
            }
        }

        context
    }

    // ── File helpers ──

    fn read_or_default<T: DeserializeOwned + Default>(&self, file: &str) -> T {
        let path = self.dir.join(file);
        if !path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {}", path.display(), e);
                T::default()
            }),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                T::default()
            }
        }
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> JournalResult<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
