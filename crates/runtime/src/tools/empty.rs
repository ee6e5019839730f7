//! Host without capabilities.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::{ToolError, ToolHost};

/// Advertises no functions, so the model can only answer in text.
///
/// Any call it still receives is reported back as an unknown function.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyToolHost;

impl ToolHost for EmptyToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &[]
    }

    async fn execute(&mut self, call: &ToolCall) -> Result<String, ToolError> {
        Err(ToolError::NotFound(call.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_call_is_unknown() {
        let mut host = EmptyToolHost;
        assert!(host.specs().is_empty());

        let err = host
            .execute(&ToolCall::new("call_1", "insert_text", "{}"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown function: insert_text");
    }
}
