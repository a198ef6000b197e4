//! Configuration management for Docent
//!
//! Configuration is loaded from `~/.docent/config.json` (or an explicit path),
//! then `.env` is read and `DOCENT_*` environment variables override file
//! values. The legacy `OLLAMA_URL`, `OLLAMA_MODEL`, `API_HOST` and `API_PORT`
//! variables are honored too, with lower precedence than the `DOCENT_*` ones.

mod types;
pub mod validate;

pub use types::*;

use crate::error::{DocentError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

impl Config {
    /// Returns the Docent configuration directory path (~/.docent)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docent")
    }

    /// Returns the path to the config file (~/.docent/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    ///
    /// A missing file yields the default configuration; a malformed one is an
    /// error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                DocentError::Config(format!("{}: {}", path.display(), e))
            })?
        } else {
            Config::default()
        };

        // A missing .env is the normal case
        let _ = dotenvy::dotenv();
        config.apply_env_overrides();

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: DOCENT_SECTION_KEY
    fn apply_env_overrides(&mut self) {
        // Legacy names first so DOCENT_* wins when both are set
        if let Ok(val) = std::env::var("OLLAMA_URL") {
            self.provider.api_base = val;
        }
        if let Ok(val) = std::env::var("OLLAMA_MODEL") {
            self.agent.model = val;
        }
        if let Ok(val) = std::env::var("API_HOST") {
            self.gateway.host = val;
        }
        env_parse("API_PORT", &mut self.gateway.port);

        // Agent
        if let Ok(val) = std::env::var("DOCENT_AGENT_SYSTEM_PROMPT") {
            self.agent.system_prompt = Some(val);
        }
        if let Ok(val) = std::env::var("DOCENT_AGENT_MODEL") {
            self.agent.model = val;
        }
        env_parse("DOCENT_AGENT_MAX_TOKENS", &mut self.agent.max_tokens);
        env_parse("DOCENT_AGENT_TEMPERATURE", &mut self.agent.temperature);
        env_parse(
            "DOCENT_AGENT_MAX_TOOL_ITERATIONS",
            &mut self.agent.max_tool_iterations,
        );
        env_parse("DOCENT_AGENT_HISTORY_WINDOW", &mut self.agent.history_window);
        env_parse(
            "DOCENT_AGENT_ITERATION_TIMEOUT_SECS",
            &mut self.agent.iteration_timeout_secs,
        );
        env_parse(
            "DOCENT_AGENT_TOOL_TIMEOUT_SECS",
            &mut self.agent.tool_timeout_secs,
        );

        // Sessions
        env_parse("DOCENT_SESSIONS_MAX_HISTORY", &mut self.sessions.max_history);
        env_parse("DOCENT_SESSIONS_TTL_SECS", &mut self.sessions.ttl_secs);

        // Provider
        if let Ok(val) = std::env::var("DOCENT_PROVIDER_API_BASE") {
            self.provider.api_base = val;
        }
        if let Ok(val) = std::env::var("DOCENT_PROVIDER_API_KEY") {
            self.provider.api_key = val;
        }
        env_parse("DOCENT_PROVIDER_MAX_RETRIES", &mut self.provider.max_retries);
        env_parse("DOCENT_PROVIDER_TIMEOUT_SECS", &mut self.provider.timeout_secs);

        // Gateway
        if let Ok(val) = std::env::var("DOCENT_GATEWAY_HOST") {
            self.gateway.host = val;
        }
        env_parse("DOCENT_GATEWAY_PORT", &mut self.gateway.port);

        // Store
        if let Ok(val) = std::env::var("DOCENT_STORE_DOCUMENTS_PATH") {
            self.store.documents_path = Some(PathBuf::from(val));
        }

        // Logging
        if let Ok(val) = std::env::var("DOCENT_LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("DOCENT_LOGGING_FILE") {
            self.logging.file = Some(val);
        }
    }

    /// Returns the configured system prompt or `None` for the built-in one.
    pub fn system_prompt(&self) -> Option<&str> {
        self.agent
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

/// Overwrite `target` with the parsed value of `key` when it is set and parses.
fn env_parse<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(v) => *target = v,
            Err(_) => tracing::warn!(key = key, value = %val, "Ignoring unparseable env override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.sessions.max_history, 20);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.agent.max_tool_iterations = 3;
        config.sessions.ttl_secs = 60;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.agent.max_tool_iterations, 3);
        assert_eq!(loaded.sessions.ttl_secs, 60);
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, DocentError::Config(_)));
    }

    #[test]
    fn test_env_parse_ignores_garbage() {
        let mut port: u16 = 8000;
        std::env::set_var("DOCENT_TEST_PORT_GARBAGE", "not-a-port");
        env_parse("DOCENT_TEST_PORT_GARBAGE", &mut port);
        assert_eq!(port, 8000);

        std::env::set_var("DOCENT_TEST_PORT_OK", "9001");
        env_parse("DOCENT_TEST_PORT_OK", &mut port);
        assert_eq!(port, 9001);
    }

    #[test]
    fn test_blank_system_prompt_falls_back() {
        let mut config = Config::default();
        assert!(config.system_prompt().is_none());
        config.agent.system_prompt = Some("   ".into());
        assert!(config.system_prompt().is_none());
        config.agent.system_prompt = Some("Answer tersely.".into());
        assert_eq!(config.system_prompt(), Some("Answer tersely."));
    }
}
