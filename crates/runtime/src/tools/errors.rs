use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while dispatching a tool call.
///
/// None of these abort the conversation: the orchestrator reports them
/// back to the model as the tool turn's content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("unknown function: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
