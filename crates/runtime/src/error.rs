use crate::model::ModelError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end an orchestration run.
///
/// Tool failures are not here: they are reported to the model as tool
/// turns and the conversation continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("no final answer after {0} rounds")]
    RoundLimit(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
