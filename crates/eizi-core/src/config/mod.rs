//! Configuration system - schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use eizi_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Provider: {}", cfg.chat_ai.provider);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{
    get_config_path, load_config, read_config_file, save_api_key, save_config, FileSettings, SettingsSource,
    StaticSettings,
};
pub use schema::{ChatAiConfig, ClientConfig, Config, RelayConfig, TransportMode, VoiceAiConfig};
