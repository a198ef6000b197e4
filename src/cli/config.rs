//! Config check command handler.

use std::path::Path;

use anyhow::{Context, Result};

use docent::config::validate::{validate_config, DiagnosticLevel};
use docent::config::Config;

use super::ConfigAction;

/// Validate configuration file.
pub(crate) fn cmd_config(action: ConfigAction, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Check => {
            println!("Config file: {}", config_path.display());

            if !config_path.exists() {
                println!("[OK] No config file found (using defaults)");
            } else {
                let content =
                    std::fs::read_to_string(config_path).context("Failed to read config file")?;
                let raw: serde_json::Value = match serde_json::from_str(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        println!("[ERROR] Invalid JSON: {}", e);
                        return Ok(());
                    }
                };
                for diag in validate_config(&raw) {
                    println!("{}", diag);
                }
            }

            // Field types and environment overrides are only checked once loaded.
            let config = match Config::load_from_path(config_path) {
                Ok(c) => c,
                Err(e) => {
                    println!("[ERROR] {}", e);
                    return Ok(());
                }
            };
            let diagnostics = config.validate();
            for diag in &diagnostics {
                println!("{}", diag);
            }

            let errors = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Error)
                .count();
            let warnings = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Warn)
                .count();

            if errors == 0 && warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} error(s), {} warning(s)", errors, warnings);
            }
        }
    }
    Ok(())
}
