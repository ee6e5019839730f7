//! Rich-text editor capability surface for the Penman runtime.
//!
//! The model edits a document through a fixed set of functions: insert,
//! delete, rewrite, inline format, block format, locate text, locate a
//! position, and read the selection.
//!
//! # Example
//!
//! ```ignore
//! use editor::{Document, EditorTools, SYSTEM_INSTRUCTION, context_for};
//! use runtime::Orchestrator;
//!
//! # async fn example(backend: impl runtime::Backend) -> runtime::Result<()> {
//! let tools = EditorTools::new(Document::from("Shopping list"));
//! let mut orchestrator = Orchestrator::new(backend, tools, SYSTEM_INSTRUCTION);
//!
//! let context = context_for(orchestrator.host().surface());
//! let answer = orchestrator.run("Make the title a header", Some(&context)).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod action;
mod document;
mod format;
mod prompt;
mod tools;

pub use action::EditorAction;
pub use document::{BlockFormats, Document, EditorSurface, InlineFormats, Run, Selection};
pub use format::{BlockStyle, FormatValue, InlineStyle, ParseError, Place};
pub use prompt::{SYSTEM_INSTRUCTION, context_for};
pub use tools::{EditorTools, editor_specs};
