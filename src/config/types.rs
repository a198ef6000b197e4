//! Configuration type definitions for Docent
//!
//! All sections implement serde traits and fall back to their defaults when a
//! field (or the whole section) is missing from the config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct for Docent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent loop settings (model, iteration budget, deadlines)
    pub agent: AgentConfig,
    /// Session store bounds
    pub sessions: SessionsConfig,
    /// Completion backend connection
    pub provider: ProviderConfig,
    /// HTTP server bind address
    pub gateway: GatewayConfig,
    /// Document corpus source
    pub store: StoreConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// Agent Configuration
// ============================================================================

/// Agent loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Replaces the built-in system instruction when set
    pub system_prompt: Option<String>,
    /// Model identifier sent with every completion request
    pub model: String,
    /// Maximum tokens for responses
    pub max_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum request/execute cycles per `run`
    pub max_tool_iterations: u32,
    /// Most recent history entries included in the transcript
    pub history_window: usize,
    /// Deadline for a single completion request, in seconds
    pub iteration_timeout_secs: u64,
    /// Deadline for a single tool call, in seconds
    pub tool_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            model: "llama2".to_string(),
            max_tokens: 1500,
            temperature: 0.7,
            max_tool_iterations: 5,
            history_window: 6,
            iteration_timeout_secs: 120,
            tool_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    pub fn iteration_timeout(&self) -> Duration {
        Duration::from_secs(self.iteration_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Session store bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Maximum stored messages per session
    pub max_history: usize,
    /// Idle seconds before a session becomes eligible for eviction
    pub ttl_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            ttl_secs: 3600,
        }
    }
}

impl SessionsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Completion backend connection (any OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL, e.g. `http://localhost:11434/v1` for Ollama
    pub api_base: String,
    /// Bearer token. Ollama ignores it but the header is still required.
    pub api_key: String,
    /// Retry attempts for transient failures. 0 disables the retry wrapper.
    pub max_retries: u32,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            api_key: "ollama".to_string(),
            max_retries: 0,
            timeout_secs: 120,
        }
    }
}

// ============================================================================
// Gateway Configuration
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

// ============================================================================
// Store Configuration
// ============================================================================

/// Document corpus source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding an array of documents. Empty corpus when unset.
    pub documents_path: Option<PathBuf>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Compact single-line output with targets
    #[default]
    Component,
    /// JSON lines
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Line format
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Append log lines to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            file: None,
        }
    }
}
