//! Tool types for Docent
//!
//! This module defines the [`Tool`] trait every capability implements, the
//! [`ToolArgs`] mapping handed to it after schema validation, and the
//! [`ToolOutput`] the dispatcher produces.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{DocentError, Result};

/// Result of one dispatch, as seen by the model.
///
/// The dispatcher never fails; handler errors become `is_error` outputs whose
/// content describes the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text appended to the transcript as the tool result.
    pub content: String,
    /// Whether this result represents an error condition.
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful result.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Error result. The model still sees the content.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Arguments that passed the tool's declared schema.
///
/// Required fields are present, typed fields have the declared type, and
/// declared defaults are filled in, so tools can read values without
/// re-checking shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Wrap an already validated mapping.
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String value for `key`, or an `InvalidArguments` error.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str(key).ok_or_else(|| {
            DocentError::InvalidArguments(format!("missing required argument '{}'", key))
        })
    }

    /// Non-negative integer value for `key`, if present.
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Non-negative integer value for `key` as `usize`, or `default`.
    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        self.u64(key)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Borrow the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arguments were supplied or defaulted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trait that all tools must implement.
///
/// Tools are the capabilities the model can request during a conversation.
/// Each one declares its parameters as a JSON schema; the registry validates
/// incoming arguments against that schema before calling `execute`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use docent::tools::{Tool, ToolArgs};
/// use docent::error::Result;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str { "echo" }
///     fn description(&self) -> &str { "Repeat the given text" }
///     fn parameters(&self) -> Value {
///         json!({
///             "type": "object",
///             "properties": {"text": {"type": "string"}},
///             "required": ["text"]
///         })
///     }
///     async fn execute(&self, args: ToolArgs) -> Result<String> {
///         Ok(args.require_str("text")?.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    ///
    /// This name is used to identify the tool when the model requests it.
    /// It must be unique within a registry.
    fn name(&self) -> &str;

    /// Get the tool description sent to the model.
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with validated arguments.
    ///
    /// Errors are caught by the registry and reported to the model as text.
    async fn execute(&self, args: ToolArgs) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => ToolArgs::new(map),
            _ => ToolArgs::default(),
        }
    }

    #[test]
    fn test_tool_output_constructors() {
        let ok = ToolOutput::ok("[]");
        assert!(!ok.is_error);
        assert_eq!(ok.content, "[]");

        let err = ToolOutput::error("Tool x not found");
        assert!(err.is_error);
    }

    #[test]
    fn test_tool_args_getters() {
        let a = args(json!({"query": "water", "limit": 5}));
        assert_eq!(a.str("query"), Some("water"));
        assert_eq!(a.u64("limit"), Some(5));
        assert_eq!(a.usize_or("limit", 10), 5);
        assert_eq!(a.usize_or("days", 7), 7);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_require_str_missing() {
        let a = args(json!({}));
        assert!(a.is_empty());
        let err = a.require_str("agency").unwrap_err();
        assert!(err.to_string().contains("missing required argument 'agency'"));
    }
}
