//! Journal - conversation history, mood entries, and reminders.
//!
//! Plain JSON files under `~/.eizi/journal/`. The dispatch layer never touches
//! this; the calling front end decides what gets persisted.

pub mod store;

pub use store::{
    find_mood, mood_palette, JournalError, JournalMessage, JournalStore, Language, Mood,
    MoodEntry, Reminder, Sender, UserMemory,
};
