//! Tools module - capabilities the model can call
//!
//! - [`Tool`]: the interface every capability implements
//! - [`ToolArgs`]: arguments after validation against the tool's schema
//! - [`ToolRegistry`]: ordered registry and never-failing dispatcher
//! - [`documents`]: the document-corpus capabilities
//!
//! # Example
//!
//! ```rust
//! use docent::store::MemoryDocumentStore;
//! use docent::tools::documents;
//! use serde_json::{json, Map};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = documents::registry(Arc::new(MemoryDocumentStore::new()));
//!
//! let mut args = Map::new();
//! args.insert("query".into(), json!("water rules"));
//! let result = registry.dispatch("search_documents", args).await;
//! assert_eq!(result, "[]");
//!
//! assert_eq!(registry.definitions().len(), 4);
//! # });
//! ```

pub mod documents;
mod registry;
pub mod schema;
mod types;

pub use registry::{ToolRegistry, ERROR_MESSAGE_LIMIT};
pub use types::{Tool, ToolArgs, ToolOutput};
