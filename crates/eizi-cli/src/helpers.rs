//! Shared CLI helpers - path expansion, reply printing, banners, key masking.

use std::path::PathBuf;

use colored::Colorize;

use eizi_providers::ChatMode;

use crate::chat::ChatTurn;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print Eizi's side of a turn. Dispatch errors go to stderr first.
pub fn print_reply(turn: &ChatTurn) {
    if let Some(ref e) = turn.error {
        eprintln!("\n{} {}", "⚠".yellow(), e.to_string().yellow());
    }
    println!();
    println!("{}", "Eizi".magenta().bold());
    println!("{}", turn.reply);
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(mode: ChatMode, welcome: Option<&str>) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Eizi".magenta().bold(), version.dimmed());
    println!(
        "{}",
        format!("Mode: {mode}. Type /mode <name> to switch, \"exit\" to quit.").dimmed()
    );
    if let Some(text) = welcome {
        println!();
        println!("{}", "Eizi".magenta().bold());
        println!("{text}");
    }
    println!();
}

/// Print a "thinking" placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "… thinking".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Show only the edges of a secret: `sk-a…wxyz`. Short keys are fully hidden.
pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/audio/clip.mp3");
        assert!(result.ends_with("audio/clip.mp3"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        assert_eq!(expand_tilde("/tmp/out.mp3"), PathBuf::from("/tmp/out.mp3"));
        assert_eq!(expand_tilde("out.mp3"), PathBuf::from("out.mp3"));
    }

    #[test]
    fn mask_key_hides_middle() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-a…mnop");
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key(""), "");
    }
}
