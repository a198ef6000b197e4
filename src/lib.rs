//! Docent - a conversational document assistant
//!
//! A language model answers questions about a document corpus by calling
//! retrieval tools in a bounded loop, while many independent conversations
//! are served concurrently from an expiring in-memory session store.

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod session;
pub mod store;
pub mod tools;
pub mod utils;

pub use agent::{AgentLoop, ContextBuilder};
pub use config::Config;
pub use error::{DocentError, ProviderError, Result};
pub use gateway::ChatHandler;
pub use providers::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};
pub use session::{Message, Role, SessionStore, ToolCall};
pub use store::{Document, DocumentStore, MemoryDocumentStore};
pub use tools::{Tool, ToolRegistry};
