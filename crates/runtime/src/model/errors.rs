use thiserror::Error;

/// Errors from completion endpoint calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never got a response.
    #[error("network: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("provider api: {status}: {body}")]
    Api { status: u16, body: String },

    /// The response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::InvalidResponse(_) => false,
        }
    }
}
