//! `eizi mood` and `eizi remind` - the journal from the command line.
//!
//! - `eizi mood add <MOOD> [--note TEXT]`
//! - `eizi mood list [-n COUNT]`
//! - `eizi mood palette`
//! - `eizi remind add <MESSAGE>`
//! - `eizi remind list [--all]`
//! - `eizi remind done <ID>` (toggles; an id prefix is enough)

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Subcommand;
use colored::Colorize;

use eizi_core::journal::{find_mood, mood_palette, JournalStore, MoodEntry, Reminder};
use eizi_providers::persona::MOOD_CHECK_PROMPTS;

// ─────────────────────────────────────────────
// Subcommand enums
// ─────────────────────────────────────────────

#[derive(Subcommand)]
pub enum MoodCommands {
    /// Log how you feel (label or palette id, e.g. "happy" or "4")
    Add {
        mood: String,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show recent moods, newest first
    List {
        /// How many entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Show the available moods
    Palette,
}

#[derive(Subcommand)]
pub enum RemindCommands {
    /// Add a reminder
    Add { message: String },

    /// List reminders
    List {
        /// Include completed reminders
        #[arg(short, long, default_value_t = false)]
        all: bool,
    },

    /// Mark a reminder done (or undone)
    Done {
        /// Reminder id (a unique prefix is enough)
        id: String,
    },
}

// ─────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────

fn open_store() -> Result<JournalStore> {
    JournalStore::new(None).context("failed to open journal")
}

pub fn dispatch_mood(cmd: MoodCommands) -> Result<()> {
    let store = open_store()?;
    match cmd {
        MoodCommands::Add { mood, note } => add_mood(&store, &mood, note),
        MoodCommands::List { count } => list_moods(&store, count),
        MoodCommands::Palette => {
            print_palette();
            Ok(())
        }
    }
}

pub fn dispatch_remind(cmd: RemindCommands) -> Result<()> {
    let store = open_store()?;
    match cmd {
        RemindCommands::Add { message } => add_reminder(&store, &message),
        RemindCommands::List { all } => list_reminders(&store, all),
        RemindCommands::Done { id } => toggle_reminder(&store, &id),
    }
}

/// Format a timestamp in local time.
fn format_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

// ─────────────────────────────────────────────
// Moods
// ─────────────────────────────────────────────

fn add_mood(store: &JournalStore, key: &str, note: Option<String>) -> Result<()> {
    let Some(mood) = find_mood(key) else {
        println!("  {} Unknown mood '{}'.", "✗".red(), key);
        print_palette();
        return Ok(());
    };

    let note = note.filter(|n| !n.trim().is_empty());
    store.add_mood_entry(MoodEntry::new(mood.clone(), note))?;
    println!("  {} Logged {} {}", "✓".green(), mood.emoji, mood.label.bold());

    // Rotate through the check-in prompts by how many moods are on file
    let logged = store.memory().mood_history.len();
    let prompt = MOOD_CHECK_PROMPTS[logged % MOOD_CHECK_PROMPTS.len()];
    println!("  {}", prompt.dimmed());
    Ok(())
}

fn list_moods(store: &JournalStore, count: usize) -> Result<()> {
    let history = store.memory().mood_history;
    if history.is_empty() {
        println!("  No moods logged yet. Try `eizi mood add happy`.");
        return Ok(());
    }

    println!();
    println!("{}", "  Mood History".cyan().bold());
    println!();
    for entry in history.iter().take(count) {
        let note = entry
            .note
            .as_deref()
            .map(|n| format!("  \"{}\"", n).dimmed().to_string())
            .unwrap_or_default();
        println!(
            "  {}  {} {:<10}{}",
            format_local(&entry.timestamp).dimmed(),
            entry.mood.emoji,
            entry.mood.label,
            note
        );
    }
    println!();
    Ok(())
}

fn print_palette() {
    println!();
    for mood in mood_palette() {
        println!("  {}  {} {}", mood.id.dimmed(), mood.emoji, mood.label);
    }
    println!();
}

// ─────────────────────────────────────────────
// Reminders
// ─────────────────────────────────────────────

fn add_reminder(store: &JournalStore, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("reminder text cannot be empty");
    }
    let reminder = Reminder::new(message);
    let id = short_id(&reminder.id).to_string();
    store.add_reminder(reminder)?;
    println!("  {} Added reminder {}", "✓".green(), id.cyan());
    Ok(())
}

fn list_reminders(store: &JournalStore, include_done: bool) -> Result<()> {
    let reminders: Vec<Reminder> = store
        .memory()
        .reminders
        .into_iter()
        .filter(|r| include_done || !r.completed)
        .collect();

    if reminders.is_empty() {
        println!(
            "  No reminders.{}",
            if include_done { "" } else { " Use --all to include completed." }
        );
        return Ok(());
    }

    println!();
    println!("{}", "  Reminders".cyan().bold());
    println!();
    for r in &reminders {
        let mark = if r.completed {
            "✓".green().to_string()
        } else {
            "·".dimmed().to_string()
        };
        let text = if r.completed {
            r.message.dimmed().to_string()
        } else {
            r.message.clone()
        };
        println!("  {} {:<10} {}", mark, short_id(&r.id).cyan(), text);
    }
    println!();
    Ok(())
}

fn toggle_reminder(store: &JournalStore, id: &str) -> Result<()> {
    match store.toggle_reminder(id) {
        Ok(true) => println!("  {} Marked {} done", "✓".green(), id.cyan()),
        Ok(false) => println!("  {} Reopened {}", "·".dimmed(), id.cyan()),
        Err(eizi_core::journal::JournalError::ReminderNotFound(_)) => {
            println!("  {} Reminder {} not found", "✗".red(), id)
        }
        Err(eizi_core::journal::JournalError::AmbiguousReminder { count, .. }) => {
            println!(
                "  {} {} matches {} reminders, use a longer id",
                "✗".red(),
                id,
                count
            )
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// First 8 characters of an id, for display.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
