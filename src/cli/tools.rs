//! Tools CLI command handlers: tool discovery and info.

use std::sync::Arc;

use anyhow::Result;

use docent::store::{DocumentStore, MemoryDocumentStore};
use docent::tools::{documents, ToolRegistry};

use super::ToolsAction;

fn registry() -> ToolRegistry {
    // Names and schemas do not depend on the documents loaded.
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    documents::registry(store)
}

/// Tool discovery commands.
pub(crate) fn cmd_tools(action: ToolsAction) -> Result<()> {
    let registry = registry();
    match action {
        ToolsAction::List => {
            println!("Available tools ({}):\n", registry.len());
            for def in registry.definitions() {
                println!("  {:<22} {}", def.name, def.description);
            }
            println!("\nUse `docent tools info <name>` for parameters.");
        }
        ToolsAction::Info { name } => {
            let Some(def) = registry
                .definitions()
                .into_iter()
                .find(|d| d.name == name)
            else {
                anyhow::bail!(
                    "Unknown tool '{}'. Available: {}",
                    name,
                    registry.names().join(", ")
                );
            };
            println!("{}\n", def.name);
            println!("{}\n", def.description);
            println!("Parameters:");
            println!("{}", serde_json::to_string_pretty(&def.parameters)?);
        }
    }
    Ok(())
}
