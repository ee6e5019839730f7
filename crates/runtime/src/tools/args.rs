//! Argument decoding for tool calls.

use crate::tools::ToolError;
use serde::de::DeserializeOwned;

/// Decode the raw JSON arguments of a tool call into `T`.
///
/// Blank input is treated as an empty object, which is what endpoints send
/// for functions without parameters.
pub fn decode_arguments<T: DeserializeOwned>(raw: &str) -> Result<T, ToolError> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Args {
        text: Option<String>,
    }

    #[test]
    fn blank_is_empty_object() {
        let args: Args = decode_arguments("  ").unwrap();
        assert!(args.text.is_none());
    }

    #[test]
    fn malformed_json_is_invalid_arguments() {
        let err = decode_arguments::<Args>("{\"text\": ").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn wrong_type_is_invalid_arguments() {
        let err = decode_arguments::<Args>(r#"{"text": 3}"#).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
