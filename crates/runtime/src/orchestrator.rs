//! The tool-calling conversation loop.

use crate::model::{Backend, Message, ModelRequest, ModelResponse, ToolCall, Usage};
use crate::retry::RetryPolicy;
use crate::tools::{ToolError, ToolHost};
use crate::{Error, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Limits applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Completion rounds allowed before giving up on a final answer.
    pub max_rounds: u32,
    /// Deadline for a single completion request.
    pub round_timeout: Duration,
    /// Deadline for a single tool call.
    pub tool_timeout: Duration,
    /// Retry policy for transient endpoint failures.
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 16,
            round_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Drives a conversation against a completion endpoint, executing the
/// function calls the model asks for until it answers without any.
///
/// The transcript is owned here and only ever appended to. It outlives a
/// single [`run`](Self::run), so follow-up requests see earlier turns.
pub struct Orchestrator<B, H> {
    backend: B,
    host: H,
    config: OrchestratorConfig,
    messages: Vec<Message>,
    usage: Usage,
}

impl<B: Backend, H: ToolHost> Orchestrator<B, H> {
    /// Create an orchestrator whose transcript starts with `system`.
    pub fn new(backend: B, host: H, system: impl Into<String>) -> Self {
        Self {
            backend,
            host,
            config: OrchestratorConfig::default(),
            messages: vec![Message::system(system)],
            usage: Usage::default(),
        }
    }

    /// Replace the default limits.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The conversation so far.
    pub fn transcript(&self) -> &[Message] {
        &self.messages
    }

    /// The tool host, e.g. to inspect the document between requests.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the tool host while no run is in progress.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Token usage accumulated over all runs.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Run one user request to completion.
    pub async fn run(&mut self, prompt: &str, context: Option<&str>) -> Result<String> {
        self.run_with_cancel(prompt, context, &CancellationToken::new())
            .await
    }

    /// Run one user request, aborting the outstanding completion request
    /// when `cancel` fires.
    ///
    /// Tool calls of a round that already started are always executed and
    /// answered, so the transcript never holds an unanswered call.
    pub async fn run_with_cancel(
        &mut self,
        prompt: &str,
        context: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.messages.push(Message::user(compose_request(prompt, context)));

        for round in 1..=self.config.max_rounds {
            let response = self.complete(cancel).await?;
            self.usage.input_tokens += response.usage.input_tokens;
            self.usage.output_tokens += response.usage.output_tokens;

            let message = response.message;
            if !message.has_tool_calls() {
                info!(round, "model produced a final answer");
                let answer = message.text().to_string();
                self.messages.push(message);
                return Ok(answer);
            }

            debug!(round, calls = message.tool_calls.len(), "model requested tool calls");
            let calls = message.tool_calls.clone();
            self.messages.push(message);
            self.dispatch(&calls).await;
        }

        warn!(max_rounds = self.config.max_rounds, "round limit reached");
        Err(Error::RoundLimit(self.config.max_rounds))
    }

    async fn complete(&self, cancel: &CancellationToken) -> Result<ModelResponse> {
        let request = ModelRequest {
            messages: &self.messages,
            tools: self.host.specs(),
        };
        let timeout = self.config.round_timeout;
        let backend = &self.backend;

        self.config
            .retry
            .run(cancel, || async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    result = tokio::time::timeout(timeout, backend.call(request)) => match result {
                        Ok(response) => response.map_err(Error::from),
                        Err(_) => Err(Error::Timeout(timeout)),
                    },
                }
            })
            .await
    }

    /// Execute every call in order. Each call gets exactly one tool turn,
    /// including calls that fail or run past `tool_timeout`.
    async fn dispatch(&mut self, calls: &[ToolCall]) {
        let timeout = self.config.tool_timeout;
        for call in calls {
            debug!(id = %call.id, name = %call.name, "executing tool call");
            let result = tokio::time::timeout(timeout, self.host.execute(call))
                .await
                .unwrap_or(Err(ToolError::Timeout(timeout)));
            let content = match result {
                Ok(output) => output,
                Err(e) => {
                    warn!(id = %call.id, name = %call.name, error = %e, "tool call failed");
                    format!("Tool call failed: {e}")
                }
            };
            self.messages.push(Message::tool_result(call.id.clone(), content));
        }
    }
}

fn compose_request(prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("{prompt}\n\n{context}"),
        None => prompt.to_string(),
    }
}
