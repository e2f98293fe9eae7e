//! `eizi status` - show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use eizi_core::config::{get_config_path, load_config, TransportMode};
use eizi_core::journal::JournalStore;
use eizi_providers::{ChatProvider, VoiceProvider, CHAT_PROVIDERS};

fn key_status(configured: bool) -> String {
    if configured {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    }
}

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Eizi Status".magenta().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Chat
    let chat = &config.chat_ai;
    let active = ChatProvider::from_name(&chat.provider);
    println!(
        "  {:<18} {} {}",
        "Chat provider:".bold(),
        active.map(|p| p.display_name()).unwrap_or(chat.provider.as_str()),
        if active.is_none() {
            "(unsupported)".red().to_string()
        } else {
            String::new()
        }
    );
    println!("  {:<18} {}", "Model:".bold(), chat.model);
    println!("  {:<18} {}", "Chat key:".bold(), key_status(chat.is_configured()));

    let transport = match config.client.transport {
        TransportMode::Relay => format!("relay → {}", config.client.relay_endpoint()),
        TransportMode::Direct => {
            let base = chat
                .api_base
                .clone()
                .or_else(|| active.map(|p| p.spec().default_api_base.to_string()))
                .unwrap_or_default();
            format!("direct → {}", base)
        }
    };
    println!("  {:<18} {}", "Transport:".bold(), transport);

    println!();
    println!("  {}", "Chat providers:".bold());
    for spec in CHAT_PROVIDERS {
        let marker = if Some(spec.provider) == active {
            "●".green().to_string()
        } else {
            "○".dimmed().to_string()
        };
        println!("    {} {:<12} {}", marker, spec.display_name, spec.default_api_base.dimmed());
    }

    // Voice
    println!();
    match config.voice_ai {
        Some(ref voice) => {
            let name = VoiceProvider::from_name(&voice.provider)
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| format!("{} (unsupported)", voice.provider));
            println!("  {:<18} {}", "Voice provider:".bold(), name);
            println!("  {:<18} {}", "Voice key:".bold(), key_status(voice.is_configured()));
        }
        None => println!("  {:<18} {}", "Voice provider:".bold(), "· not configured".dimmed()),
    }

    // Relay server
    println!();
    println!(
        "  {:<18} {}:{}{} → {}",
        "Relay server:".bold(),
        config.relay.host,
        config.relay.port,
        config.relay.path,
        config.relay.upstream_base
    );
    println!("  {:<18} {}", "Relay key:".bold(), key_status(config.relay.is_configured()));

    // Journal
    if let Ok(journal) = JournalStore::new(None) {
        let memory = journal.memory();
        let open = memory.reminders.iter().filter(|r| !r.completed).count();
        println!();
        println!(
            "  {:<18} {} messages, {} moods, {} open reminders",
            "Journal:".bold(),
            journal.messages().len(),
            memory.mood_history.len(),
            open
        );
    }

    println!();
    Ok(())
}
