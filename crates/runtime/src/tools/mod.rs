//! Tool dispatch seam between the orchestrator and capability surfaces.

mod args;
mod empty;
pub mod errors;
mod host;

pub use args::decode_arguments;
pub use empty::EmptyToolHost;
pub use errors::ToolError;
pub use host::ToolHost;
