//! OpenAI-compatible provider
//!
//! Speaks the `/chat/completions` API shared by OpenAI, Ollama, vLLM and
//! most local inference servers. The default base URL points at a local
//! Ollama instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use docent::providers::{openai::OpenAIProvider, ChatOptions, LLMProvider};
//! use docent::session::Message;
//!
//! async fn example() {
//!     let provider = OpenAIProvider::new("ollama", "llama2");
//!
//!     let messages = vec![
//!         Message::system("You are a helpful assistant."),
//!         Message::user("Hello!"),
//!     ];
//!
//!     let response = provider
//!         .chat(messages, vec![], None, ChatOptions::default())
//!         .await
//!         .unwrap();
//!
//!     println!("{}", response.content);
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{DocentError, ProviderError, Result};
use crate::session::{Message, ToolCall};

use super::{parse_provider_error, ChatOptions, LLMProvider, LLMResponse, ToolDefinition, Usage};

/// Default endpoint: a local Ollama server's OpenAI-compatible API.
pub const DEFAULT_API_BASE: &str = "http://localhost:11434/v1";

/// The default model to use.
const DEFAULT_MODEL: &str = "llama2";

// ============================================================================
// Request Types
// ============================================================================

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    /// "auto" whenever tools are offered
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A message in wire format.
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    /// Null for an assistant message that only carries tool calls
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    /// Tool name on tool-result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest {
    id: String,
    r#type: &'static str,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    /// JSON-encoded arguments. Some servers send an object instead of a string.
    #[serde(deserialize_with = "arguments_as_string")]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    r#type: &'static str,
    function: OpenAIFunctionDef,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCallResponse {
    #[serde(default)]
    id: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

fn arguments_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ============================================================================
// Provider
// ============================================================================

/// OpenAI-compatible completion provider.
pub struct OpenAIProvider {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

impl OpenAIProvider {
    /// Create a provider against the default local endpoint.
    ///
    /// # Example
    /// ```
    /// use docent::providers::openai::OpenAIProvider;
    /// use docent::providers::LLMProvider;
    ///
    /// let provider = OpenAIProvider::new("ollama", "mistral");
    /// assert_eq!(provider.name(), "openai");
    /// assert_eq!(provider.default_model(), "mistral");
    /// ```
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_client(api_key, DEFAULT_API_BASE, model, Client::new())
    }

    /// Create a provider with a custom base URL (trailing slash removed).
    pub fn with_base_url(api_key: &str, api_base: &str, model: &str) -> Self {
        Self::with_client(api_key, api_base, model, Client::new())
    }

    /// Create a provider with a custom HTTP client.
    pub fn with_client(api_key: &str, api_base: &str, model: &str, client: Client) -> Self {
        let model = if model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            model
        };
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }

    /// Build from the `provider` config section and the agent's model.
    pub fn from_config(config: &ProviderConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self::with_client(
            &config.api_key,
            &config.api_base,
            model,
            client,
        ))
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert transcript messages to wire format.
fn convert_messages(messages: Vec<Message>) -> Vec<OpenAIMessage> {
    messages
        .into_iter()
        .map(|msg| match msg {
            Message::System { content } => OpenAIMessage {
                role: "system",
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            },
            Message::User { content } => OpenAIMessage {
                role: "user",
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            },
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let has_calls = !tool_calls.is_empty();
                OpenAIMessage {
                    role: "assistant",
                    content: if content.is_empty() && has_calls {
                        None
                    } else {
                        Some(content)
                    },
                    tool_calls: has_calls.then(|| {
                        tool_calls
                            .into_iter()
                            .map(|tc| OpenAIToolCallRequest {
                                id: tc.id,
                                r#type: "function",
                                function: OpenAIFunctionCall {
                                    name: tc.name,
                                    arguments: tc.arguments,
                                },
                            })
                            .collect()
                    }),
                    tool_call_id: None,
                    name: None,
                }
            }
            Message::Tool {
                tool_call_id,
                name,
                content,
            } => OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_call_id),
                name: Some(name),
            },
        })
        .collect()
}

/// Convert tool definitions to wire format.
fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<OpenAITool> {
    tools
        .into_iter()
        .map(|t| OpenAITool {
            r#type: "function",
            function: OpenAIFunctionDef {
                name: t.name,
                description: t.description,
                parameters: t.parameters,
            },
        })
        .collect()
}

/// Convert the first choice of a response. No choices is an error.
fn convert_response(response: OpenAIResponse) -> Result<LLMResponse> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        DocentError::Provider("completion response contained no choices".to_string())
    })?;

    let content = choice.message.content.unwrap_or_default();
    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, tc)| {
            // Some local servers omit ids; keep them unique within the message
            let id = if tc.id.is_empty() {
                format!("call_{}", i)
            } else {
                tc.id
            };
            ToolCall::new(&id, &tc.function.name, &tc.function.arguments)
        })
        .collect();

    let mut llm_response = LLMResponse::with_tools(&content, tool_calls);
    if let Some(usage) = response.usage {
        llm_response =
            llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
    }
    Ok(llm_response)
}

// ============================================================================
// LLMProvider Implementation
// ============================================================================

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let model = model.unwrap_or(&self.model);
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (Some(convert_tools(tools)), Some("auto"))
        };

        let request = OpenAIRequest {
            model: model.to_string(),
            messages: convert_messages(messages),
            tools,
            tool_choice,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(model = %model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocentError::ProviderTyped(ProviderError::Timeout(e.to_string()))
                } else {
                    DocentError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            warn!(status = status.as_u16(), error = %detail, "Completion request rejected");
            return Err(parse_provider_error(status.as_u16(), &detail).into());
        }

        let body: OpenAIResponse = response.json().await.map_err(|e| {
            DocentError::Provider(format!("Failed to parse completion response: {}", e))
        })?;

        convert_response(body)
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAIProvider::new("ollama", "");
        assert_eq!(provider.default_model(), "llama2");
        assert_eq!(provider.api_base(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let provider = OpenAIProvider::with_base_url("k", "https://custom.api/v1/", "m");
        assert_eq!(provider.api_base(), "https://custom.api/v1");
    }

    #[test]
    fn test_from_config() {
        let config = ProviderConfig {
            api_base: "http://inference:8080/v1".into(),
            ..ProviderConfig::default()
        };
        let provider = OpenAIProvider::from_config(&config, "mistral").unwrap();
        assert_eq!(provider.api_base(), "http://inference:8080/v1");
        assert_eq!(provider.default_model(), "mistral");
    }

    #[test]
    fn test_convert_messages_roles() {
        let call = ToolCall::new("call_1", "search_documents", r#"{"query": "water"}"#);
        let converted = convert_messages(vec![
            Message::system("You are helpful"),
            Message::user("Hello"),
            Message::assistant_with_tools("", vec![call]),
            Message::tool_result("call_1", "search_documents", "[]"),
            Message::assistant("Nothing found."),
        ]);

        let roles: Vec<_> = converted.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool", "assistant"]);

        assert!(converted[2].content.is_none());
        let calls = converted[2].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].r#type, "function");
        assert_eq!(calls[0].function.name, "search_documents");

        assert_eq!(converted[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(converted[3].name.as_deref(), Some("search_documents"));
        assert!(converted[4].tool_calls.is_none());
    }

    #[test]
    fn test_request_serialization_with_tools() {
        let request = OpenAIRequest {
            model: "llama2".to_string(),
            messages: convert_messages(vec![Message::user("Hello")]),
            tools: Some(convert_tools(vec![ToolDefinition::new(
                "get_document_stats",
                "Stats",
                json!({"type": "object", "properties": {}}),
            )])),
            tool_choice: Some("auto"),
            max_tokens: Some(1500),
            temperature: Some(0.7),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!("auto"));
        assert_eq!(value["tools"][0]["type"], json!("function"));
        assert_eq!(value["tools"][0]["function"]["name"], json!("get_document_stats"));
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_request_without_tools_omits_choice() {
        let request = OpenAIRequest {
            model: "llama2".to_string(),
            messages: vec![],
            tools: None,
            tool_choice: None,
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("tools"));
        assert!(!json.contains("tool_choice"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_convert_response_with_tool_calls() {
        let body: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "content": null,
                "tool_calls": [
                    {"id": "call_9", "type": "function",
                     "function": {"name": "search_documents", "arguments": "{\"query\":\"water rules\"}"}},
                    {"type": "function",
                     "function": {"name": "get_document_stats", "arguments": {}}}
                ]
            }}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }))
        .unwrap();

        let converted = convert_response(body).unwrap();
        assert_eq!(converted.content, "");
        assert_eq!(converted.tool_calls.len(), 2);
        assert_eq!(converted.tool_calls[0].id, "call_9");
        assert_eq!(converted.tool_calls[0].arguments, r#"{"query":"water rules"}"#);
        // Missing id filled, object arguments re-encoded
        assert_eq!(converted.tool_calls[1].id, "call_1");
        assert_eq!(converted.tool_calls[1].arguments, "{}");
        assert_eq!(converted.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_convert_response_empty_choices_is_error() {
        let body: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(convert_response(body).is_err());
    }

    #[test]
    fn test_convert_response_text_only() {
        let body: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        }))
        .unwrap();
        let converted = convert_response(body).unwrap();
        assert_eq!(converted.content, "Hello!");
        assert!(!converted.has_tool_calls());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_error() {
        // Port 9 (discard) on loopback is closed in test environments
        let provider = OpenAIProvider::with_base_url("k", "http://127.0.0.1:9/v1", "m");
        let result = provider
            .chat(vec![Message::user("hi")], vec![], None, ChatOptions::new())
            .await;
        assert!(result.is_err());
    }
}
