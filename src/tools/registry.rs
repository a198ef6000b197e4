//! Tool registry for Docent
//!
//! This module provides the [`ToolRegistry`] that holds every capability the
//! model may call, in a stable registration order, and dispatches calls to
//! them. Dispatch never fails: unknown names, schema violations, handler
//! errors, panics and timeouts all come back as text the model can read.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::providers::ToolDefinition;
use crate::utils::string::preview;

use super::schema::validate_arguments;
use super::{Tool, ToolOutput};

/// Maximum characters of a failure message echoed back to the model.
pub const ERROR_MESSAGE_LIMIT: usize = 200;

/// A registry that holds and dispatches tools.
///
/// Built once at startup, then shared read-only (`Arc<ToolRegistry>`) by
/// every conversation.
///
/// # Example
///
/// ```rust
/// use docent::store::MemoryDocumentStore;
/// use docent::tools::{documents, ToolRegistry};
/// use serde_json::Map;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let registry = documents::registry(Arc::new(MemoryDocumentStore::new()));
/// assert_eq!(registry.names()[0], "search_documents");
///
/// let missing = registry.dispatch("launch_rockets", Map::new()).await;
/// assert_eq!(missing, "Tool launch_rockets not found");
/// # });
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
    timeout: Option<Duration>,
}

impl ToolRegistry {
    /// Create a new empty tool registry without a per-call deadline.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            timeout: None,
        }
    }

    /// Bound every tool call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Register a new tool in the registry.
    ///
    /// A tool with an existing name replaces the old one in the same
    /// position, so the order seen by the model does not change.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        info!(tool = %name, "Registering tool");
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Tool definitions in registration order, for every completion request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Dispatch a call and return only the text result.
    pub async fn dispatch(&self, name: &str, args: Map<String, Value>) -> String {
        self.execute(name, args).await.content
    }

    /// Dispatch a call by name.
    ///
    /// Arguments are validated against the tool's schema first; a violation
    /// is reported exactly like a handler failure.
    pub async fn execute(&self, name: &str, args: Map<String, Value>) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            warn!(tool = %name, "Tool not found");
            return ToolOutput::error(format!("Tool {} not found", name));
        };

        let args = match validate_arguments(&tool.parameters(), args) {
            Ok(a) => a,
            Err(e) => {
                warn!(tool = %name, error = %e, "Rejected tool arguments");
                return failure(name, &e.to_string());
            }
        };

        let start = Instant::now();
        let call = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(r) => r,
                Err(_) => {
                    error!(tool = %name, timeout_ms = limit.as_millis() as u64, "Tool timed out");
                    return failure(
                        name,
                        &format!("timed out after {}s", limit.as_secs_f32()),
                    );
                }
            },
            None => call.await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(content)) => {
                info!(tool = %name, duration_ms, "Tool executed successfully");
                ToolOutput::ok(content)
            }
            Ok(Err(e)) => {
                error!(tool = %name, error = %e, duration_ms, "Tool execution failed");
                failure(name, &e.to_string())
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                error!(tool = %name, panic = %msg, duration_ms, "Tool panicked");
                failure(name, &msg)
            }
        }
    }

    /// Get the names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Check if a tool exists in the registry.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn failure(name: &str, message: &str) -> ToolOutput {
    ToolOutput::error(format!(
        "Error executing tool {}: {}",
        name,
        preview(message, ERROR_MESSAGE_LIMIT)
    ))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
