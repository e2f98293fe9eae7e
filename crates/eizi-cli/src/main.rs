//! Eizi CLI - entry point.
//!
//! # Commands
//!
//! - `eizi relay [--host H] [--port P]` - run the credential-holding relay
//! - `eizi chat [-m MESSAGE] [--mode MODE] [--direct]` - talk to the coach (single-shot or REPL)
//! - `eizi speak TEXT [-o FILE]` - synthesize speech to an audio file
//! - `eizi mood add|list|palette` - mood journal
//! - `eizi remind add|list|done` - reminders
//! - `eizi config set-key|show` - settings
//! - `eizi onboard` - initialize config + journal
//! - `eizi status` - show configuration and provider status

mod chat;
mod config_cmd;
mod helpers;
mod journal_cmd;
mod onboard;
mod repl;
mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use eizi_core::config::{load_config, FileSettings, TransportMode};
use eizi_core::journal::JournalStore;
use eizi_providers::{ChatDispatcher, ChatMode, SpeechDispatcher};

use crate::chat::ChatSession;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Eizi - an honest, adaptive chat journal
#[derive(Parser)]
#[command(name = "eizi", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay endpoint (holds the provider API key)
    Relay {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat with Eizi (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation mode: normal, real, soft, low-battery
        #[arg(long, default_value = "normal")]
        mode: ChatMode,

        /// Call the provider directly with the local key instead of the relay
        #[arg(long, default_value_t = false)]
        direct: bool,

        /// Don't write this conversation to the journal
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Turn text into speech and save the audio
    Speak {
        /// Text to speak
        text: String,

        /// Output file (`~` is expanded)
        #[arg(short, long, default_value = "eizi-speech.mp3")]
        out: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Log and review moods
    Mood {
        #[command(subcommand)]
        action: journal_cmd::MoodCommands,
    },

    /// Manage reminders
    Remind {
        #[command(subcommand)]
        action: journal_cmd::RemindCommands,
    },

    /// View or change settings
    Config {
        #[command(subcommand)]
        action: config_cmd::ConfigCommands,
    },

    /// Initialize configuration and journal
    Onboard,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Relay { host, port, logs } => {
            init_logging(logs);
            run_relay(host, port).await
        }
        Commands::Chat {
            message,
            mode,
            direct,
            no_save,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, mode, direct, !no_save).await
        }
        Commands::Speak { text, out, logs } => {
            init_logging(logs);
            run_speak(&text, &helpers::expand_tilde(&out)).await
        }
        Commands::Mood { action } => journal_cmd::dispatch_mood(action),
        Commands::Remind { action } => journal_cmd::dispatch_remind(action),
        Commands::Config { action } => config_cmd::dispatch(action),
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Relay command
// ─────────────────────────────────────────────

async fn run_relay(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut relay = load_config(None).relay;
    if let Some(host) = host {
        relay.host = host;
    }
    if let Some(port) = port {
        relay.port = port;
    }

    println!(
        "{} relay on http://{}:{}{}",
        "Eizi".cyan().bold(),
        relay.host,
        relay.port,
        relay.path
    );
    eizi_relay::run(&relay).await
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, mode: ChatMode, direct: bool, persist: bool) -> Result<()> {
    let settings = Arc::new(ChatSettings::new(direct));
    let dispatcher = ChatDispatcher::new(settings);
    let journal = JournalStore::new(None).context("failed to open journal")?;
    let session = ChatSession::new(dispatcher, journal, mode, persist);

    match message {
        Some(msg) => {
            info!(mode = %mode, "processing single message");
            let turn = session.ask(&msg).await?;
            helpers::print_reply(&turn);
        }
        None => {
            repl::run(session).await?;
        }
    }

    Ok(())
}

/// File settings with an optional forced direct transport.
struct ChatSettings {
    file: FileSettings,
    force_direct: bool,
}

impl ChatSettings {
    fn new(force_direct: bool) -> Self {
        Self {
            file: FileSettings::new(None),
            force_direct,
        }
    }
}

impl eizi_core::config::SettingsSource for ChatSettings {
    fn load(&self) -> eizi_core::config::Config {
        let mut config = self.file.load();
        if self.force_direct {
            config.client.transport = TransportMode::Direct;
        }
        config
    }
}

// ─────────────────────────────────────────────
// Speak command
// ─────────────────────────────────────────────

async fn run_speak(text: &str, out: &Path) -> Result<()> {
    let speech = SpeechDispatcher::new(Arc::new(FileSettings::new(None)));

    helpers::print_thinking();
    let result = speech.text_to_speech(text).await;
    helpers::clear_thinking();

    let clip = result?;
    let blob = speech
        .blobs()
        .get(&clip.audio_url)
        .context("synthesized clip missing from blob store")?;

    std::fs::write(out, &blob.bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;
    speech.blobs().revoke(&clip.audio_url);

    println!(
        "  {} wrote {} ({} bytes, {})",
        "✓".green(),
        out.display(),
        clip.byte_len,
        clip.mime_type
    );
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("eizi=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
