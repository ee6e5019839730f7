//! Transcript types and the completion endpoint trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{
    Backend, Message, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
