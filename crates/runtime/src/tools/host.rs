//! Tool host trait.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::ToolError;
use std::future::Future;

/// Trait for tool execution hosts.
///
/// A host owns the capability surface its tools act on. `execute` takes
/// `&mut self` because calls mutate that surface and must be applied one
/// at a time, in the order the model requested them.
pub trait ToolHost: Send {
    /// Declarations advertised to the model.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool call, returning the text reported back to the model.
    fn execute(&mut self, call: &ToolCall) -> impl Future<Output = Result<String, ToolError>> + Send;
}
