//! Gateway command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use docent::config::validate::DiagnosticLevel;
use docent::config::Config;
use docent::gateway::{server, ChatHandler};

/// Start the HTTP gateway.
pub(crate) async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let mut errors = 0;
    for diag in config.validate() {
        match diag.level {
            DiagnosticLevel::Error => {
                errors += 1;
                eprintln!("{}", diag);
            }
            DiagnosticLevel::Warn => warn!(path = %diag.path, "{}", diag.message),
            DiagnosticLevel::Ok => {}
        }
    }
    if errors > 0 {
        anyhow::bail!("Configuration has {} error(s); run `docent config check`", errors);
    }

    let handler = Arc::new(
        ChatHandler::from_config(&config).context("Failed to initialize chat handler")?,
    );
    info!(
        model = handler.model(),
        tools = handler.registry().len(),
        max_history = config.sessions.max_history,
        ttl_secs = config.sessions.ttl_secs,
        "Starting gateway"
    );

    server::serve(handler, &config.gateway.host, config.gateway.port)
        .await
        .context("Gateway stopped with an error")
}
