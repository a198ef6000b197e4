//! Context builder for agent conversations
//!
//! Builds the transcript sent with the first completion request: one system
//! instruction, the most recent slice of history, then the new user message.

use crate::session::Message;

/// Default system prompt for the document assistant
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful Federal Register document assistant. You have access to a database of federal documents, regulations, and government publications.

You can help users by:
- Searching for documents by keywords
- Finding recent documents from specific time periods
- Filtering documents by government agency
- Providing statistics about the document database

Always use the appropriate tools to find current, accurate information from the database before responding. When presenting results, summarize the key information clearly and mention the source (Federal Register database).

Be helpful, accurate, and informative in your responses."#;

/// Default number of history entries included in a transcript.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// Builder for the system prompt and transcript of one agent run.
///
/// # Example
///
/// ```rust
/// use docent::agent::ContextBuilder;
/// use docent::session::Message;
///
/// let history: Vec<Message> = (0..10)
///     .map(|i| Message::user(format!("turn {}", i)))
///     .collect();
///
/// let transcript = ContextBuilder::new().build_messages(&history, "latest question");
/// // system + 6 history entries + user
/// assert_eq!(transcript.len(), 8);
/// assert_eq!(transcript[1].content(), "turn 4");
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
    history_window: usize,
}

impl ContextBuilder {
    /// Create a new context builder with the default prompt and window.
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Set a custom system prompt.
    ///
    /// # Example
    /// ```rust
    /// use docent::agent::ContextBuilder;
    ///
    /// let builder = ContextBuilder::new().with_system_prompt("Answer in one sentence.");
    /// assert_eq!(builder.build_system_message().content(), "Answer in one sentence.");
    /// ```
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set how many of the most recent history entries are included.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Number of history entries included in a transcript.
    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Build the system message.
    pub fn build_system_message(&self) -> Message {
        Message::system(self.system_prompt.as_str())
    }

    /// The most recent `history_window` entries of `history`.
    ///
    /// Tool results cut off from the assistant message that requested them
    /// are dropped from the front of the window.
    pub fn window<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        let start = history.len().saturating_sub(self.history_window);
        let mut slice = &history[start..];
        while let Some((first, rest)) = slice.split_first() {
            if !first.is_tool_result() {
                break;
            }
            slice = rest;
        }
        slice
    }

    /// Build the full transcript: system, windowed history, then the query.
    pub fn build_messages(&self, history: &[Message], query: &str) -> Vec<Message> {
        let recent = self.window(history);
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(self.build_system_message());
        messages.extend_from_slice(recent);
        messages.push(Message::user(query));
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
