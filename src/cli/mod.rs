//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod ask;
pub mod config;
#[cfg(feature = "server")]
pub mod serve;
pub mod tools;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use docent::config::Config;

#[derive(Parser)]
#[command(name = "docent")]
#[command(version)]
#[command(about = "Conversational assistant for federal document search", long_about = None)]
struct Cli {
    /// Config file (default: ~/.docent/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default)
    Serve {
        /// Bind address (overrides gateway.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides gateway.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ask a question, or chat interactively when no message is given
    Ask {
        /// Message to answer (non-interactive mode)
        #[arg(short, long)]
        message: Option<String>,
        /// Session id to continue
        #[arg(long)]
        session: Option<String>,
    },
    /// List available tools
    Tools {
        #[command(subcommand)]
        action: Option<ToolsAction>,
    },
    /// Validate configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ToolsAction {
    /// List tool names and descriptions
    List,
    /// Show a tool's parameter schema
    Info {
        /// Tool name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Check the config file for errors
    Check,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::path);

    match cli.command {
        // Validation reports on malformed files instead of failing to load them.
        Some(Commands::Config { action }) => config::cmd_config(action, &config_path),
        Some(Commands::Tools { action }) => {
            tools::cmd_tools(action.unwrap_or(ToolsAction::List))
        }
        Some(Commands::Ask { message, session }) => {
            let config = load_config(&config_path)?;
            ask::cmd_ask(config, message, session).await
        }
        Some(Commands::Serve { host, port }) => {
            let config = load_config(&config_path)?;
            cmd_serve(config, host, port).await
        }
        None => {
            let config = load_config(&config_path)?;
            cmd_serve(config, None, None).await
        }
    }
}

/// Load config and install the tracing subscriber it describes.
fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_from_path(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    docent::utils::logging::init_logging(&config.logging)
        .context("Failed to initialize logging")?;
    Ok(config)
}

#[cfg(feature = "server")]
async fn cmd_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    serve::cmd_serve(config, host, port).await
}

#[cfg(not(feature = "server"))]
async fn cmd_serve(_config: Config, _host: Option<String>, _port: Option<u16>) -> Result<()> {
    anyhow::bail!("docent was built without the `server` feature; use `docent ask` instead")
}
