//! Penman runtime: the tool-calling conversation loop.
//!
//! This crate drives a conversation with a chat-completion endpoint that
//! may answer with function-call requests. Each requested call is executed
//! against a stateful capability surface and its result fed back to the
//! model, until the model replies without asking for more calls.
//!
//! # Overview
//!
//! - **Orchestrator**: owns the append-only transcript and runs the
//!   request / dispatch loop, bounded by a round cap, a per-request timeout
//!   and an optional cancellation token.
//! - **Backend**: a trait abstracting the completion endpoint
//!   (OpenAI-compatible chat completions, Azure included).
//! - **ToolHost**: a trait for the capability surface the model acts on.
//!   Tool failures are reported back to the model, never raised.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{EmptyToolHost, OpenAiAuth, OpenAiBackend, Orchestrator};
//!
//! # async fn example() -> runtime::Result<()> {
//! let auth = OpenAiAuth::AzureKey("...".into());
//! let backend = OpenAiBackend::builder(auth, "gpt-4o-mini")
//!     .base_url("https://my-resource.openai.azure.com")
//!     .build();
//!
//! let mut orchestrator = Orchestrator::new(backend, EmptyToolHost, "Be concise.");
//! let answer = orchestrator.run("Hello!", None).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
mod orchestrator;
mod providers;
mod retry;
pub mod tools;

pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use providers::{OpenAiAuth, OpenAiBackend, OpenAiBackendBuilder};
pub use retry::RetryPolicy;
pub use tools::{EmptyToolHost, ToolError, ToolHost, decode_arguments};

/// Re-exported so callers can cancel runs without depending on `tokio-util`.
pub use tokio_util::sync::CancellationToken;
