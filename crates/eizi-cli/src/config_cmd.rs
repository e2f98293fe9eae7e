//! `eizi config` - view and change settings.
//!
//! - `eizi config set-key <KEY> [--provider NAME]` - store the chat credential
//! - `eizi config set-transport <relay|direct>`
//! - `eizi config set-name <NAME>` / `set-language <english|taglish>` - profile
//! - `eizi config show` - print the effective config with secrets masked

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use eizi_core::config::{
    get_config_path, load_config, read_config_file, save_api_key, save_config, Config,
    TransportMode,
};
use eizi_core::journal::{JournalStore, Language};
use eizi_providers::{ChatProvider, CHAT_PROVIDERS};

use crate::helpers::mask_key;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Save the chat API key (used by the direct transport)
    SetKey {
        api_key: String,

        /// Chat provider: openai, anthropic, mistral, perplexity
        #[arg(short, long, default_value = "openai")]
        provider: String,
    },

    /// Choose how chat requests are sent
    SetTransport { transport: TransportMode },

    /// Tell Eizi your name
    SetName { name: String },

    /// Preferred language: english or taglish
    SetLanguage { language: String },

    /// Print the effective configuration (keys masked)
    Show,
}

pub fn dispatch(cmd: ConfigCommands) -> Result<()> {
    let path = get_config_path();
    match cmd {
        ConfigCommands::SetKey { api_key, provider } => set_key(&path, &provider, &api_key),
        ConfigCommands::SetTransport { transport } => set_transport(&path, transport),
        ConfigCommands::SetName { name } => {
            journal()?.set_user_name(name.trim())?;
            println!("  {} Nice to meet you, {}.", "✓".green(), name.trim().bold());
            Ok(())
        }
        ConfigCommands::SetLanguage { language } => {
            let language = parse_language(&language)?;
            journal()?.set_language(language)?;
            println!("  {} Language set to {:?}", "✓".green(), language);
            Ok(())
        }
        ConfigCommands::Show => {
            println!("{}", masked_json(&load_config(Some(&path)))?);
            Ok(())
        }
    }
}

fn journal() -> Result<JournalStore> {
    JournalStore::new(None).context("failed to open journal")
}

fn set_key(path: &Path, provider: &str, api_key: &str) -> Result<()> {
    let Some(parsed) = ChatProvider::from_name(provider) else {
        let names: Vec<&str> = CHAT_PROVIDERS.iter().map(|s| s.name).collect();
        anyhow::bail!("unknown provider '{}' (expected one of: {})", provider, names.join(", "));
    };
    if api_key.trim().is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    save_api_key(parsed.spec().name, api_key.trim(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "  {} Saved {} key {}",
        "✓".green(),
        parsed.display_name(),
        mask_key(api_key.trim()).dimmed()
    );
    Ok(())
}

fn set_transport(path: &Path, transport: TransportMode) -> Result<()> {
    // Env overrides are not applied, so env secrets never land on disk
    let mut config =
        read_config_file(path).with_context(|| format!("failed to read {}", path.display()))?;
    config.client.transport = transport;
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} Transport set to {:?}", "✓".green(), transport);
    Ok(())
}

fn parse_language(s: &str) -> Result<Language> {
    match s.trim().to_ascii_lowercase().as_str() {
        "english" | "en" => Ok(Language::English),
        "taglish" => Ok(Language::Taglish),
        other => anyhow::bail!("unknown language '{}' (expected english or taglish)", other),
    }
}

/// Pretty JSON of `config` with every credential masked.
fn masked_json(config: &Config) -> Result<String> {
    let mut shown = config.clone();
    shown.chat_ai.api_key = mask_key(&shown.chat_ai.api_key);
    if let Some(ref mut voice) = shown.voice_ai {
        voice.api_key = mask_key(&voice.api_key);
    }
    shown.relay.api_key = mask_key(&shown.relay.api_key);
    serde_json::to_string_pretty(&shown).context("failed to serialize config")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_key_writes_provider_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        set_key(&path, "Anthropic", "sk-ant-1234567890").unwrap();
        let saved = read_config_file(&path).unwrap();
        assert_eq!(saved.chat_ai.provider, "anthropic");
        assert_eq!(saved.chat_ai.api_key, "sk-ant-1234567890");
    }

    #[test]
    fn set_key_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(set_key(&path, "unknown-provider", "k").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn set_transport_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set_transport(&path, TransportMode::Direct).unwrap();
        assert_eq!(read_config_file(&path).unwrap().client.transport, TransportMode::Direct);
    }

    #[test]
    fn set_transport_leaves_broken_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let content = r#"{"chatAi":{"model":"mistral-small"},}"#;
        std::fs::write(&path, content).unwrap();

        assert!(set_transport(&path, TransportMode::Direct).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn masked_json_hides_secrets() {
        let mut config = Config::default();
        config.chat_ai.api_key = "sk-chat-abcdefghijkl".into();
        config.relay.api_key = "sk-relay-abcdefghijkl".into();
        let json = masked_json(&config).unwrap();
        assert!(!json.contains("sk-chat-abcdefghijkl"));
        assert!(!json.contains("sk-relay-abcdefghijkl"));
        assert!(json.contains("ijkl"));
    }

    #[test]
    fn language_parsing() {
        assert_eq!(parse_language("Taglish").unwrap(), Language::Taglish);
        assert_eq!(parse_language("en").unwrap(), Language::English);
        assert!(parse_language("klingon").is_err());
    }
}
