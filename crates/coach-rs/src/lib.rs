//! Prompt-response gateway for the reply coach and skin-analysis front ends.
//!
//! `coach-rs` turns a user request into a chat completion call against an
//! OpenAI-compatible API and normalizes whatever comes back into text a
//! browser can render. Every request is independent; nothing is stored.
//!
//! ```text
//! tone::resolve ──▶ prompt::build_* ──▶ ChatBackend::complete ──▶ normalize::*
//! ```
//!
//! # Getting started
//!
//! ```ignore
//! use coach_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GatewayError> {
//!     let config = GatewayConfig::from_env()?;
//!     let gateway = Gateway::from_config(&config)?;
//!
//!     let batch = gateway
//!         .generate_replies("오늘 뭐해?", Some("friend"), &ReplyOptions::default())
//!         .await?;
//!     for reply in &batch.replies {
//!         println!("{} ({})", reply.sentence, reply.risk);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tone`] | Closed tone table and [`resolve`](tone::resolve) |
//! | [`prompt`] | System/user prompt construction for analysis, reply and fix |
//! | [`normalize`] | Completion text extraction with fallback, reply-line parsing |
//! | [`style`] | Length-based writing-style classification |
//! | [`ocr`] | [`OcrEngine`](ocr::OcrEngine) seam with a not-ready stub |
//! | [`gateway`] | [`Gateway`](gateway::Gateway): the operations the HTTP layer calls |
//! | [`config`] | [`GatewayConfig`](config::GatewayConfig) from the environment |
//! | [`api`] | Retry policy and request correlation ids |
//! | [`error`] | [`GatewayError`](error::GatewayError) |

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod ocr;
pub mod prelude;
pub mod prompt;
pub mod style;
pub mod tone;

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::api::RetryConfig;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::normalize::UpstreamCompletion;

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unset optional fields are omitted.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

/// Message body: plain text, or a list of parts for multimodal input.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text carried by this content (all text parts, newline-joined).
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
    /// A `data:` URL or a remote URL.
    pub url: String,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// A user message carrying a text part followed by an image part.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }
}

// ── Backend seam ───────────────────────────────────────────────────

/// Boxed future returned by [`ChatBackend::complete`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<UpstreamCompletion>> + Send + 'a>>;

/// Anything that can answer a chat completion request.
///
/// [`OpenAiClient`] is the production implementation. The gateway only sees
/// this trait, so tests substitute canned backends.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, request: ChatRequest) -> CompletionFuture<'_>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
///
/// Construct once at startup and share; the inner `reqwest::Client` pools
/// connections across concurrent requests.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coach-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Send a chat completion request, retrying transient failures if the
    /// retry policy allows it.
    pub async fn chat(&self, body: &ChatRequest) -> Result<UpstreamCompletion> {
        let mut attempt = 0;
        loop {
            match self.send_once(body).await {
                Ok(completion) => return Ok(completion),
                Err(e) if attempt < self.retry.max_retries && e.is_transient() => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "Upstream attempt {} failed ({e}), retrying in {:.1}s",
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, body: &ChatRequest) -> Result<UpstreamCompletion> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={:?}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                detail: upstream_error_detail(&text),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| GatewayError::Upstream {
                status: status.as_u16(),
                detail: format!("malformed response body: {e}"),
            })?;
        Ok(UpstreamCompletion(value))
    }
}

impl ChatBackend for OpenAiClient {
    fn complete(&self, request: ChatRequest) -> CompletionFuture<'_> {
        Box::pin(async move { self.chat(&request).await })
    }
}

/// Pull the human-readable message out of an upstream error body.
///
/// Understands `{"error": {"message": ...}}` and `{"error": "..."}`; any
/// other body is passed through as-is.
pub fn upstream_error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorField,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Object { message: String },
        Message(String),
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorField::Object { message } | ErrorField::Message(message),
        }) => message,
        Err(_) => body.trim().to_string(),
    }
}
