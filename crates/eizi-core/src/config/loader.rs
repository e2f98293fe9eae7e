//! Config loader - reads `~/.eizi/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.eizi/config.json`
//! 3. Environment variables `EIZI_<SECTION>__<FIELD>` (override JSON)
//!
//! [`SettingsSource`] wraps this for the dispatch layer, which must see the
//! latest saved settings on every call.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, VoiceAiConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Store a chat credential (and provider) for immediate use.
///
/// Reads the file as-is (no env overrides) so env-provided secrets are
/// never written to disk.
pub fn save_api_key(provider: &str, api_key: &str, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    let mut config = read_config_file(&config_path)?;
    config.chat_ai.provider = provider.to_string();
    config.chat_ai.api_key = api_key.to_string();
    save_config(&config, Some(&config_path))
}

/// Parse the config file as written, without env overrides.
///
/// A missing file yields defaults. A file that exists but does not parse is
/// an `InvalidData` error, so callers that save afterwards leave it untouched.
pub fn read_config_file(path: &Path) -> std::io::Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&content).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("invalid config JSON in {}: {}", path.display(), e),
        )
    })
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `EIZI_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `EIZI_CHAT_AI__PROVIDER|API_KEY|MODEL|API_BASE` → `chatAi.*`
/// - `EIZI_VOICE_AI__PROVIDER|API_KEY|VOICE_ID|REGION` → `voiceAi.*`
/// - `EIZI_RELAY__URL` → `client.relayUrl`
/// - `EIZI_CLIENT__TRANSPORT` → `client.transport`
/// - `EIZI_RELAY__HOST|PORT|UPSTREAM_BASE|API_KEY` → `relay.*`
/// - `OPENAI_API_KEY` → `relay.apiKey` (when `EIZI_RELAY__API_KEY` is unset)
/// - `OPENAI_ORG_ID` → `relay.organization`
fn apply_env_overrides(mut config: Config) -> Config {
    // Chat provider
    if let Ok(val) = std::env::var("EIZI_CHAT_AI__PROVIDER") {
        config.chat_ai.provider = val;
    }
    if let Ok(val) = std::env::var("EIZI_CHAT_AI__API_KEY") {
        config.chat_ai.api_key = val;
    }
    if let Ok(val) = std::env::var("EIZI_CHAT_AI__MODEL") {
        config.chat_ai.model = val;
    }
    if let Ok(val) = std::env::var("EIZI_CHAT_AI__API_BASE") {
        config.chat_ai.api_base = Some(val);
    }

    // Voice provider - any voice var materializes the section
    apply_voice_env(&mut config.voice_ai);

    // Client
    if let Ok(val) = std::env::var("EIZI_RELAY__URL") {
        config.client.relay_url = val;
    }
    if let Ok(val) = std::env::var("EIZI_CLIENT__TRANSPORT") {
        match val.parse() {
            Ok(mode) => config.client.transport = mode,
            Err(e) => warn!("Ignoring EIZI_CLIENT__TRANSPORT: {}", e),
        }
    }

    // Relay server
    if let Ok(val) = std::env::var("EIZI_RELAY__HOST") {
        config.relay.host = val;
    }
    if let Ok(val) = std::env::var("EIZI_RELAY__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.relay.port = p;
        }
    }
    if let Ok(val) = std::env::var("EIZI_RELAY__UPSTREAM_BASE") {
        config.relay.upstream_base = val;
    }
    if let Ok(val) = std::env::var("EIZI_RELAY__API_KEY") {
        config.relay.api_key = val;
    } else if let Ok(val) = std::env::var("OPENAI_API_KEY") {
        config.relay.api_key = val;
    }
    if let Ok(val) = std::env::var("OPENAI_ORG_ID") {
        if !val.is_empty() {
            config.relay.organization = Some(val);
        }
    }

    config
}

fn apply_voice_env(voice: &mut Option<VoiceAiConfig>) {
    let provider = std::env::var("EIZI_VOICE_AI__PROVIDER").ok();
    let api_key = std::env::var("EIZI_VOICE_AI__API_KEY").ok();
    let voice_id = std::env::var("EIZI_VOICE_AI__VOICE_ID").ok();
    let region = std::env::var("EIZI_VOICE_AI__REGION").ok();

    if provider.is_none() && api_key.is_none() && voice_id.is_none() && region.is_none() {
        return;
    }

    let cfg = voice.get_or_insert_with(VoiceAiConfig::default);
    if let Some(val) = provider {
        cfg.provider = val;
    }
    if let Some(val) = api_key {
        cfg.api_key = val;
    }
    if voice_id.is_some() {
        cfg.voice_id = voice_id;
    }
    if region.is_some() {
        cfg.region = region;
    }
}

// ─────────────────────────────────────────────
// SettingsSource
// ─────────────────────────────────────────────

/// Resolves the current settings immediately before each dispatch.
///
/// Implementations must not cache across calls: a save between two
/// dispatches has to be visible to the second one.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Config;
}

/// Settings read from the config file (+ env) on every call.
#[derive(Clone, Debug, Default)]
pub struct FileSettings {
    path: Option<PathBuf>,
}

impl FileSettings {
    /// `None` → `~/.eizi/config.json`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl SettingsSource for FileSettings {
    fn load(&self) -> Config {
        load_config(self.path.as_deref())
    }
}

/// Fixed in-memory settings (embedding, tests).
#[derive(Clone, Debug, Default)]
pub struct StaticSettings(pub Config);

impl SettingsSource for StaticSettings {
    fn load(&self) -> Config {
        self.0.clone()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
