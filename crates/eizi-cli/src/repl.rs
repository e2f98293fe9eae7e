//! Interactive chat REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Lines starting with `/` are session commands, everything else goes to Eizi.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use eizi_providers::persona::WELCOME_MESSAGE;
use eizi_providers::ChatMode;

use crate::chat::ChatSession;
use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// What a REPL line asks for.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Exit,
    SwitchMode(ChatMode),
    BadMode(String),
    Clear,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if EXIT_COMMANDS.contains(&trimmed.to_lowercase().as_str()) {
        return Input::Exit;
    }
    if let Some(rest) = trimmed.strip_prefix("/mode") {
        return match rest.trim().parse::<ChatMode>() {
            Ok(mode) => Input::SwitchMode(mode),
            Err(e) => Input::BadMode(e),
        };
    }
    if trimmed.eq_ignore_ascii_case("/clear") {
        return Input::Clear;
    }
    Input::Message(trimmed)
}

/// Run the interactive REPL loop.
pub async fn run(mut session: ChatSession) -> Result<()> {
    let welcome = session
        .journal()
        .messages()
        .is_empty()
        .then_some(WELCOME_MESSAGE);
    helpers::print_banner(session.mode(), welcome);

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        if input.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        match parse_input(&input) {
            Input::Exit => {
                println!("\nTake care. 👋");
                break;
            }
            Input::SwitchMode(mode) => {
                session.set_mode(mode);
                println!("{}", format!("Switched to {mode} mode.").dimmed());
            }
            Input::BadMode(e) => eprintln!("{}", e.red()),
            Input::Clear => {
                session.journal().clear_messages()?;
                println!("{}", "Chat history cleared.".dimmed());
            }
            Input::Message(text) => {
                debug!(mode = %session.mode(), "processing input");
                helpers::print_thinking();
                let turn = session.ask(text).await;
                helpers::clear_thinking();
                match turn {
                    Ok(turn) => helpers::print_reply(&turn),
                    Err(e) => eprintln!("\n❌ Error: {e}\n"),
                }
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> std::path::PathBuf {
    eizi_core::utils::get_data_path().join("history").join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("EXIT"), Input::Exit);
        assert_eq!(parse_input("/quit"), Input::Exit);
        assert_eq!(parse_input(" :q "), Input::Exit);
        assert_eq!(parse_input("exit strategy"), Input::Message("exit strategy"));
    }

    #[test]
    fn mode_command() {
        assert_eq!(parse_input("/mode real"), Input::SwitchMode(ChatMode::Real));
        assert_eq!(parse_input("/mode low-battery"), Input::SwitchMode(ChatMode::LowBattery));
        assert!(matches!(parse_input("/mode loud"), Input::BadMode(_)));
    }

    #[test]
    fn plain_message_is_trimmed() {
        assert_eq!(parse_input("  I'm tired  "), Input::Message("I'm tired"));
        assert_eq!(parse_input("/clear"), Input::Clear);
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".eizi"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }
}
