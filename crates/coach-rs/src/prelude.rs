//! Convenience re-exports for the most commonly used types.
//!
//! ```ignore
//! use coach_rs::prelude::*;
//! ```

// Upstream client and wire types.
pub use crate::{
    ChatBackend, ChatRequest, CompletionFuture, Message, MessageContent, MessageRole,
    OpenAiClient,
};

// Configuration and errors.
pub use crate::config::GatewayConfig;
pub use crate::error::GatewayError;

// Gateway operations and their outputs.
pub use crate::gateway::{CompletionSettings, FixedReply, Gateway, ReplyBatch};
pub use crate::prompt::{AnalysisRequest, Concerns, ReplyOptions};
pub use crate::style::{StyleLabel, StyleProfile};
pub use crate::tone::ToneKey;

// Normalization.
pub use crate::normalize::{
    FALLBACK_TEXT, MalformedLine, ParseError, ReplyRecord, UpstreamCompletion, extract_text,
    parse_reply_lines,
};

// OCR seam.
pub use crate::ocr::{NotReadyOcr, OcrEngine, OcrImage};
