//! Session types for Docent
//!
//! This module defines the core conversation types: the role-tagged
//! [`Message`], the model-emitted [`ToolCall`], and the bounded [`Session`]
//! owned by the session store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// A single message in a conversation.
///
/// Role-specific fields only exist on the variants where they are valid:
/// tool calls ride on assistant messages, and the correlation id plus tool
/// name ride on tool results.
///
/// Serializes with a `role` tag, matching the wire shape chat-completion
/// backends expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompts and instructions
    System { content: String },
    /// Messages from the user
    User { content: String },
    /// Messages from the model. `content` may be empty when the message only
    /// carries tool calls.
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The result of one tool call
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    /// Create a new system message.
    ///
    /// # Example
    /// ```
    /// use docent::session::{Message, Role};
    ///
    /// let msg = Message::system("You are a helpful assistant.");
    /// assert_eq!(msg.role(), Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use docent::session::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role(), Role::User);
    /// assert_eq!(msg.content(), "Hello, assistant!");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create a new assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message with tool calls.
    ///
    /// # Example
    /// ```
    /// use docent::session::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "search_documents", r#"{"query": "water"}"#);
    /// let msg = Message::assistant_with_tools("", vec![call]);
    /// assert!(msg.has_tool_calls());
    /// ```
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a tool result message answering the call with `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// The role of the message sender.
    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    /// The text payload, possibly empty.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls carried by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Check if this message has tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Check if this is a tool result message.
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Message::Tool { .. })
    }

    /// True for the entries a stored exchange is made of: user messages and
    /// assistant messages without tool calls.
    pub fn is_conversational(&self) -> bool {
        match self {
            Message::User { .. } => true,
            Message::Assistant { tool_calls, .. } => tool_calls.is_empty(),
            _ => false,
        }
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Messages from the user
    User,
    /// Messages from the AI assistant
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call made by the assistant.
///
/// `arguments` is kept as the raw JSON text the model produced; it is decoded
/// only when the call is dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, unique within the assistant message
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use docent::session::ToolCall;
    ///
    /// let call = ToolCall::new("call_123", "search_documents", r#"{"query": "rust"}"#);
    /// assert_eq!(call.name, "search_documents");
    /// ```
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }

    /// Decode the arguments into a key/value mapping.
    ///
    /// Anything that is not a JSON object (malformed text, `null`, an array)
    /// yields an empty mapping; the tool's schema check decides whether that
    /// is acceptable.
    ///
    /// # Example
    /// ```
    /// use docent::session::ToolCall;
    ///
    /// assert!(ToolCall::new("c", "t", "{not json").arguments_map().is_empty());
    /// assert_eq!(ToolCall::new("c", "t", r#"{"limit": 3}"#).arguments_map().len(), 1);
    /// ```
    pub fn arguments_map(&self) -> Map<String, Value> {
        if self.arguments.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Bounded conversational state for one session id.
///
/// Only the session store creates and mutates sessions; callers see cloned
/// history snapshots.
#[derive(Debug, Clone)]
pub struct Session {
    /// Caller-supplied identifier
    pub id: String,
    /// Stored user/assistant exchanges, oldest first
    pub messages: Vec<Message>,
    /// Monotonic time of the last append
    pub last_activity: Instant,
}

impl Session {
    /// Create a new empty session touched at `now`.
    pub fn new(id: &str, now: Instant) -> Self {
        Self {
            id: id.to_string(),
            messages: Vec::new(),
            last_activity: now,
        }
    }

    /// Append one exchange, then drop whole pairs from the front until at
    /// most `cap` messages remain.
    pub fn push_exchange(&mut self, user: Message, assistant: Message, cap: usize, now: Instant) {
        self.messages.push(user);
        self.messages.push(assistant);
        while self.messages.len() > cap {
            let drop = self.messages.len().min(2);
            self.messages.drain(..drop);
        }
        self.last_activity = now;
    }

    /// How long the session has been idle as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Whether the idle time strictly exceeds `ttl`.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.idle_for(now) > ttl
    }

    /// Get the number of messages in this session.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Check if this session is empty (no messages).
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("Hello").role(), Role::User);
        assert_eq!(Message::assistant("Hi").content(), "Hi");
        assert_eq!(Message::system("Be brief").role(), Role::System);

        let result = Message::tool_result("call_123", "get_document_stats", "{}");
        assert_eq!(result.role(), Role::Tool);
        assert!(result.is_tool_result());
        assert!(result.tool_calls().is_empty());
    }

    #[test]
    fn test_message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "Hello"}));

        let json = serde_json::to_value(Message::tool_result("c1", "search_documents", "[]")).unwrap();
        assert_eq!(
            json,
            json!({"role": "tool", "tool_call_id": "c1", "name": "search_documents", "content": "[]"})
        );
    }

    #[test]
    fn test_assistant_skips_empty_tool_calls() {
        let json = serde_json::to_string(&Message::assistant("Done")).unwrap();
        assert!(!json.contains("tool_calls"));

        let call = ToolCall::new("c1", "search_documents", "{}");
        let json = serde_json::to_string(&Message::assistant_with_tools("", vec![call])).unwrap();
        assert!(json.contains("tool_calls"));
    }

    #[test]
    fn test_assistant_deserializes_without_content() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(msg, Message::assistant(""));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct SearchArgs {
            query: String,
        }

        let call = ToolCall::new("call_1", "search_documents", r#"{"query": "rust"}"#);
        let args: SearchArgs = call.parse_arguments().unwrap();
        assert_eq!(args.query, "rust");
    }

    #[test]
    fn test_is_conversational() {
        assert!(Message::user("hi").is_conversational());
        assert!(Message::assistant("hello").is_conversational());
        assert!(!Message::system("rules").is_conversational());
        assert!(!Message::tool_result("c1", "search_documents", "[]").is_conversational());
        let call = ToolCall::new("c1", "search_documents", "{}");
        assert!(!Message::assistant_with_tools("", vec![call]).is_conversational());
    }

    #[test]
    fn test_arguments_map_degrades_to_empty() {
        assert!(ToolCall::new("c", "t", "").arguments_map().is_empty());
        assert!(ToolCall::new("c", "t", "null").arguments_map().is_empty());
        assert!(ToolCall::new("c", "t", "[1, 2]").arguments_map().is_empty());
        assert!(ToolCall::new("c", "t", "{\"query\": ").arguments_map().is_empty());

        let map = ToolCall::new("c", "t", r#"{"query": "water", "limit": 5}"#).arguments_map();
        assert_eq!(map["query"], json!("water"));
        assert_eq!(map["limit"], json!(5));
    }

    #[test]
    fn test_push_exchange_trims_whole_pairs() {
        let start = Instant::now();
        let mut session = Session::new("s", start);
        for i in 0..11 {
            session.push_exchange(
                Message::user(format!("q{}", i)),
                Message::assistant(format!("a{}", i)),
                20,
                start,
            );
        }
        assert_eq!(session.message_count(), 20);
        assert_eq!(session.messages[0], Message::user("q1"));
        assert_eq!(session.messages[1], Message::assistant("a1"));
    }

    #[test]
    fn test_push_exchange_refreshes_activity() {
        let start = Instant::now();
        let mut session = Session::new("s", start);
        let later = start + Duration::from_secs(30);
        session.push_exchange(Message::user("q"), Message::assistant("a"), 20, later);
        assert_eq!(session.last_activity, later);
        assert_eq!(session.idle_for(later), Duration::ZERO);
    }

    #[test]
    fn test_is_expired_is_strict() {
        let start = Instant::now();
        let session = Session::new("s", start);
        let ttl = Duration::from_secs(3600);
        assert!(!session.is_expired(start + ttl, ttl));
        assert!(session.is_expired(start + ttl + Duration::from_secs(1), ttl));
        assert!(!session.is_expired(start, ttl));
    }
}
