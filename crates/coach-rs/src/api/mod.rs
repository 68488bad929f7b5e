//! Upstream API plumbing shared by the [`OpenAiClient`](crate::OpenAiClient).
//!
//! - [`retry`]: optional backoff for transient failures. Off by default.
//! - [`tracing`]: request correlation ids.

pub mod retry;
pub mod tracing;

pub use retry::RetryConfig;
pub use tracing::generate_request_id;
