//! Response normalization: upstream completion → text → reply records.
//!
//! Upstream payloads arrive in one of two shapes:
//!
//! - **choices** (chat completions): `choices[0].message.content`
//! - **output** (responses API): `output[0].content[0].text`
//!
//! [`try_extract_text`] reports which way extraction failed as a
//! [`ParseError`]; [`extract_text`] turns any such failure into
//! [`FALLBACK_TEXT`] so the HTTP layer never sends an empty payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::prompt::REPLY_FIELD_DELIMITER;

/// User-facing placeholder substituted when no text can be extracted.
pub const FALLBACK_TEXT: &str = "결과를 생성하지 못했습니다. 잠시 후 다시 시도해 주세요.";

/// Raw JSON body returned by the upstream API on success.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCompletion(pub serde_json::Value);

impl From<serde_json::Value> for UpstreamCompletion {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("completion matches neither the choices nor the output shape")]
    MissingText,
    #[error("completion text is empty")]
    EmptyText,
}

// ── Payload shapes ─────────────────────────────────────────────────

// Only the first element of each shape is read; later elements may be
// anything.

fn choices_text(value: &serde_json::Value) -> Option<&str> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

fn output_text(value: &serde_json::Value) -> Option<&str> {
    value
        .get("output")?
        .get(0)?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
}

// ── Text extraction ────────────────────────────────────────────────

/// Extract the completion text, trying the choices shape before the output
/// shape. The text is returned unmodified; only an empty string counts as
/// empty.
pub fn try_extract_text(completion: &UpstreamCompletion) -> Result<String, ParseError> {
    let mut saw_empty = false;
    for text in [choices_text(&completion.0), output_text(&completion.0)]
        .into_iter()
        .flatten()
    {
        if text.is_empty() {
            saw_empty = true;
        } else {
            return Ok(text.to_string());
        }
    }
    Err(if saw_empty {
        ParseError::EmptyText
    } else {
        ParseError::MissingText
    })
}

/// Like [`try_extract_text`], but never fails.
pub fn extract_text(completion: &UpstreamCompletion) -> String {
    match try_extract_text(completion) {
        Ok(text) => text,
        Err(e) => {
            warn!("Using fallback text: {e}");
            FALLBACK_TEXT.to_string()
        }
    }
}

// ── Reply lines ────────────────────────────────────────────────────

/// One parsed reply candidate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReplyRecord {
    /// The sentence to send.
    pub sentence: String,
    /// Risk descriptor, informally "score · label".
    pub risk: String,
    /// Sense/wit descriptor, same format.
    pub sense: String,
    /// One-line rationale.
    pub comment: String,
}

/// A reply line that does not split into exactly four fields.
#[derive(Error, Serialize, Clone, Debug, PartialEq, Eq)]
#[error("line {line_number}: expected 4 fields separated by `||`, found {field_count}")]
pub struct MalformedLine {
    /// 1-based line number in the original text.
    pub line_number: usize,
    pub line: String,
    pub field_count: usize,
}

/// Split one line into a [`ReplyRecord`].
pub fn parse_reply_line(line_number: usize, line: &str) -> Result<ReplyRecord, MalformedLine> {
    let fields: Vec<&str> = line.split(REPLY_FIELD_DELIMITER).map(str::trim).collect();
    match fields.as_slice() {
        [sentence, risk, sense, comment] => Ok(ReplyRecord {
            sentence: (*sentence).to_string(),
            risk: (*risk).to_string(),
            sense: (*sense).to_string(),
            comment: (*comment).to_string(),
        }),
        _ => Err(MalformedLine {
            line_number,
            line: line.to_string(),
            field_count: fields.len(),
        }),
    }
}

/// Parse every non-blank line of `text`. A malformed line is reported in
/// place and does not stop the remaining lines from being parsed.
pub fn parse_reply_lines(text: &str) -> Vec<Result<ReplyRecord, MalformedLine>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_reply_line(idx + 1, line))
        .collect()
}

/// First non-blank line of `text`, trimmed.
pub fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
