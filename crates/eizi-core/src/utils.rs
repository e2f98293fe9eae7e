//! Utility helpers - data paths and string trimming for log output.

use std::path::PathBuf;

/// Get the Eizi data directory (e.g. `~/.eizi/`).
pub fn get_data_path() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".eizi")
}

/// Get the journal directory (e.g. `~/.eizi/journal/`).
pub fn get_journal_path() -> PathBuf {
    get_data_path().join("journal")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
