//! Gateway configuration loaded from the environment.
//!
//! [`GatewayConfig::from_env`] reads a `.env` file if one exists, then the
//! process environment. The API credential is mandatory: a missing key fails
//! at startup instead of producing empty responses later.

use std::time::Duration;

use secrecy::SecretString;

use crate::api::RetryConfig;
use crate::error::{GatewayError, Result};

/// Default upstream endpoint (OpenAI chat completions).
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Model for text-only calls.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Model for image analysis.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

/// Upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to construct an [`OpenAiClient`](crate::OpenAiClient)
/// and a [`Gateway`](crate::gateway::Gateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bearer credential. Env: `OPENAI_API_KEY` (required).
    pub api_key: SecretString,
    /// Env: `OPENAI_API_URL`.
    pub api_url: String,
    /// Env: `COACH_MODEL`.
    pub model: String,
    /// Env: `COACH_VISION_MODEL`.
    pub vision_model: String,
    /// Env: `COACH_TEMPERATURE`. Default `0.7`.
    pub temperature: f32,
    /// Env: `COACH_MAX_TOKENS`. `0` leaves the limit to the upstream.
    pub max_tokens: u32,
    /// Env: `COACH_TIMEOUT_SECS`.
    pub timeout: Duration,
    /// Env: `COACH_MAX_RETRIES`. Default `0`.
    pub retry: RetryConfig,
}

impl GatewayConfig {
    /// Defaults for everything except the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 0,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }

    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            GatewayError::Config("OPENAI_API_KEY is not set (check the server environment)".into())
        })?;

        let mut config = Self::new(api_key.trim());
        if let Some(url) = get("OPENAI_API_URL") {
            config.api_url = url;
        }
        if let Some(model) = get("COACH_MODEL") {
            config.model = model;
        }
        if let Some(model) = get("COACH_VISION_MODEL") {
            config.vision_model = model;
        }
        if let Some(raw) = get("COACH_TEMPERATURE") {
            config.temperature = parse_number("COACH_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("COACH_MAX_TOKENS") {
            config.max_tokens = parse_number("COACH_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = get("COACH_TIMEOUT_SECS") {
            let secs: u64 = parse_number("COACH_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(GatewayError::Config(
                    "COACH_TIMEOUT_SECS must be greater than 0".into(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("COACH_MAX_RETRIES") {
            config.retry = RetryConfig::with_retries(parse_number("COACH_MAX_RETRIES", &raw)?);
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| GatewayError::Config(format!("{key}={raw:?}: {e}")))
}
