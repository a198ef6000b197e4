//! Agent module - the bounded tool-calling conversation loop
//!
//! The agent turns one user query plus a history snapshot into one answer:
//!
//! - Builds the transcript (system instruction, recent history, query)
//! - Requests completions from the configured [`LLMProvider`](crate::providers::LLMProvider)
//! - Executes the tools the model selects and feeds the results back
//! - Stops at the first final answer or when the iteration budget is spent
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ ChatHandler │────>│  AgentLoop  │────>│ LLMProvider │
//! │ (gateway)   │     │             │     │ (Ollama)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │SessionStore │     │ToolRegistry │
//! └─────────────┘     └─────────────┘
//! ```

mod context;
mod r#loop;

pub use context::{ContextBuilder, DEFAULT_HISTORY_WINDOW, DEFAULT_SYSTEM_PROMPT};
pub use r#loop::{
    AgentLoop, AgentRun, RunOutcome, BACKEND_UNAVAILABLE_REPLY, BUDGET_EXHAUSTED_REPLY,
    DEFAULT_MAX_ITERATIONS, EMPTY_ANSWER_REPLY,
};
