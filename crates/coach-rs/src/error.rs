//! Error taxonomy for gateway operations.
//!
//! [`GatewayError`] covers everything a request can fail with. Parse
//! failures on the upstream completion are deliberately *not* in here: they
//! are absorbed into the fallback string by
//! [`extract_text`](crate::normalize::extract_text) and only surface as
//! [`ParseError`](crate::normalize::ParseError) to callers that ask for them.

use thiserror::Error;

/// Result alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// All failures a gateway operation can report to its caller.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required input field is missing or blank. The message is shown to
    /// the end user as-is.
    #[error("{0}")]
    Validation(String),

    /// The upstream API answered with a non-success status, or with a body
    /// that is not JSON at all.
    #[error("upstream API HTTP {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// The request never produced a response (connect failure, timeout).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    /// Whether the failure is worth another attempt (429, 5xx, network).
    ///
    /// Validation, configuration and 4xx failures are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Upstream { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Whether the upstream call ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Transport(e) if e.is_timeout())
    }
}
