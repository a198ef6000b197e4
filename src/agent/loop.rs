//! Agent loop implementation
//!
//! This module provides the bounded request/execute cycle: ask the
//! completion backend for the next step, run whatever tools it selects, and
//! stop at the first final answer or when the iteration budget runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DocentError, Result};
use crate::providers::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};
use crate::session::Message;
use crate::tools::ToolRegistry;

use super::context::ContextBuilder;

/// Reply used when the completion backend fails or times out.
pub const BACKEND_UNAVAILABLE_REPLY: &str =
    "I'm sorry, I'm having trouble connecting to the AI service right now. Please try again.";

/// Reply used when the model's final answer is empty.
pub const EMPTY_ANSWER_REPLY: &str = "I'm not sure how to help with that query.";

/// Reply used when the iteration budget runs out before a final answer.
pub const BUDGET_EXHAUSTED_REPLY: &str =
    "I tried to help but ran into some complexity issues. Could you please rephrase your question?";

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// How a single run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a non-empty final answer.
    Answered,
    /// The model's final answer was empty; the fallback reply was used.
    EmptyAnswer,
    /// A completion request failed or timed out.
    BackendUnavailable,
    /// Every iteration requested tools.
    BudgetExhausted,
}

/// Result of [`AgentLoop::run_detailed`].
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Text returned to the user
    pub answer: String,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Completion requests made
    pub iterations: u32,
    /// Tool calls executed across all iterations
    pub tool_calls: usize,
}

impl AgentRun {
    fn finish(answer: &str, outcome: RunOutcome, iterations: u32, tool_calls: usize) -> Self {
        Self {
            answer: answer.to_string(),
            outcome,
            iterations,
            tool_calls,
        }
    }
}

/// Drives the conversation between the completion backend and the tools.
///
/// The loop holds no session state. It receives a history snapshot, builds a
/// transcript from it and returns only the answer text; persisting the
/// exchange is the caller's job.
///
/// # Example
///
/// ```rust,ignore
/// use docent::agent::AgentLoop;
/// use docent::providers::OpenAIProvider;
/// use docent::tools::ToolRegistry;
///
/// let provider = OpenAIProvider::new("ollama", "llama2");
/// let agent = AgentLoop::new(Box::new(provider), ToolRegistry::new());
/// let answer = agent.run("How many documents are there?", &[]).await;
/// ```
pub struct AgentLoop {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    context_builder: ContextBuilder,
    model: Option<String>,
    options: ChatOptions,
    max_iterations: u32,
    iteration_timeout: Option<Duration>,
}

impl AgentLoop {
    /// Create an agent loop with the default prompt, window and budget.
    pub fn new(provider: Box<dyn LLMProvider>, tools: ToolRegistry) -> Self {
        Self {
            provider: Arc::from(provider),
            tools: Arc::new(tools),
            context_builder: ContextBuilder::new(),
            model: None,
            options: ChatOptions::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            iteration_timeout: None,
        }
    }

    /// Create an agent loop configured from the `agent` section.
    pub fn from_config(config: &Config, provider: Box<dyn LLMProvider>, tools: ToolRegistry) -> Self {
        let agent = &config.agent;
        let mut context_builder = ContextBuilder::new().with_history_window(agent.history_window);
        if let Some(prompt) = config.system_prompt() {
            context_builder = context_builder.with_system_prompt(prompt);
        }

        Self::new(provider, tools)
            .with_context_builder(context_builder)
            .with_model(&agent.model)
            .with_options(
                ChatOptions::new()
                    .with_max_tokens(agent.max_tokens)
                    .with_temperature(agent.temperature),
            )
            .with_max_iterations(agent.max_tool_iterations)
            .with_iteration_timeout(agent.iteration_timeout())
    }

    /// Replace the context builder.
    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    /// Override the provider's default model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Set the options sent with every completion request.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum number of completion requests per run.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Bound each completion request. A request that overruns counts as a
    /// backend failure.
    pub fn with_iteration_timeout(mut self, timeout: Duration) -> Self {
        self.iteration_timeout = Some(timeout);
        self
    }

    /// The tool registry shared by every run.
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Name of the configured completion backend.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model sent with completion requests.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Iteration budget per run.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The context builder used for transcripts.
    pub fn context_builder(&self) -> &ContextBuilder {
        &self.context_builder
    }

    /// Answer `query` given prior `history`. Never fails: every failure is
    /// turned into one of the fixed replies.
    pub async fn run(&self, query: &str, history: &[Message]) -> String {
        self.run_detailed(query, history).await.answer
    }

    /// Like [`run`](Self::run), also reporting how the run ended.
    pub async fn run_detailed(&self, query: &str, history: &[Message]) -> AgentRun {
        let mut transcript = self.context_builder.build_messages(history, query);
        let definitions = self.tools.definitions();
        let mut tool_calls = 0;

        for iteration in 1..=self.max_iterations {
            debug!(iteration, max_iterations = self.max_iterations, "Requesting completion");

            let response = match self.complete(&transcript, &definitions).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(iteration, error = %e, "Completion backend unavailable");
                    return AgentRun::finish(
                        BACKEND_UNAVAILABLE_REPLY,
                        RunOutcome::BackendUnavailable,
                        iteration,
                        tool_calls,
                    );
                }
            };

            if !response.has_tool_calls() {
                if response.content.trim().is_empty() {
                    info!(iteration, tool_calls, "Model returned an empty answer");
                    return AgentRun::finish(
                        EMPTY_ANSWER_REPLY,
                        RunOutcome::EmptyAnswer,
                        iteration,
                        tool_calls,
                    );
                }
                debug!(iteration, tool_calls, "Model returned a final answer");
                return AgentRun {
                    answer: response.content,
                    outcome: RunOutcome::Answered,
                    iterations: iteration,
                    tool_calls,
                };
            }

            let calls = response.tool_calls.clone();
            info!(iteration, tool_calls = calls.len(), "Model requested tools");
            transcript.push(response.into_message());

            // Emission order; later calls may rely on earlier results.
            for call in &calls {
                debug!(tool = %call.name, id = %call.id, "Executing tool");
                let output = self.tools.execute(&call.name, call.arguments_map()).await;
                transcript.push(Message::tool_result(&call.id, &call.name, output.content));
            }
            tool_calls += calls.len();
        }

        warn!(
            iterations = self.max_iterations,
            tool_calls, "Iteration budget exhausted without a final answer"
        );
        AgentRun::finish(
            BUDGET_EXHAUSTED_REPLY,
            RunOutcome::BudgetExhausted,
            self.max_iterations,
            tool_calls,
        )
    }

    async fn complete(
        &self,
        transcript: &[Message],
        definitions: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let start = Instant::now();
        let request = self.provider.chat(
            transcript.to_vec(),
            definitions.to_vec(),
            self.model.as_deref(),
            self.options.clone(),
        );

        let response = match self.iteration_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                DocentError::Timeout(format!(
                    "completion request exceeded {}s",
                    limit.as_secs_f32()
                ))
            })??,
            None => request.await?,
        };

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            tool_calls = response.tool_calls.len(),
            "Completion received"
        );
        Ok(response)
    }
}
