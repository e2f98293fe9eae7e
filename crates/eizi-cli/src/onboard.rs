//! `eizi onboard` - initialize configuration and journal.
//!
//! - Creates `~/.eizi/config.json` with defaults
//! - Creates the journal and history directories

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use eizi_core::config::{get_config_path, save_config, Config};
use eizi_core::utils::{get_data_path, get_journal_path};

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Eizi Setup".magenta().bold());
    println!();

    ensure_config(&get_config_path())?;

    let journal_dir = get_journal_path();
    std::fs::create_dir_all(&journal_dir)?;
    println!("  {} journal at {}", "✓".green(), journal_dir.display());

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)?;

    println!();
    println!("  Next steps:");
    println!(
        "    {} run the relay with your key: {}",
        "1.".dimmed(),
        "OPENAI_API_KEY=sk-... eizi relay".cyan()
    );
    println!(
        "    {} mark chat as configured:     {}",
        "2.".dimmed(),
        "eizi config set-key <key>".cyan()
    );
    println!("    {} start talking:              {}", "3.".dimmed(), "eizi chat".cyan());
    println!();

    Ok(())
}

/// Write a default config if none exists. Returns `true` if one was created.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        println!("  {} config already exists at {}", "✓".green(), path.display());
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))?;
    println!("  {} created config at {}", "✓".green(), path.display());
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_config_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert!(ensure_config(&path).unwrap());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"chatAi\""));

        std::fs::write(&path, "{\"chatAi\":{\"model\":\"custom\"}}").unwrap();
        assert!(!ensure_config(&path).unwrap());
        // Should NOT overwrite
        assert!(std::fs::read_to_string(&path).unwrap().contains("custom"));
    }
}
