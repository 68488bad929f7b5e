//! Writing-style classification from a pasted text sample.
//!
//! The profile is derived purely from the sample's length in characters.
//! Nothing is stored: the generated style id embeds the label slug, so a
//! later reply request can recover the label from the id alone.

use serde::{Deserialize, Serialize};

use crate::api::tracing::unique_suffix;
use crate::error::{GatewayError, Result};

/// Samples shorter than this many characters are `short/terse`.
pub const SHORT_STYLE_MAX_CHARS: usize = 50;

/// Samples shorter than this (and not short) are `casual/everyday`.
pub const CASUAL_STYLE_MAX_CHARS: usize = 200;

const STYLE_ID_PREFIX: &str = "style-";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleLabel {
    #[serde(rename = "short/terse")]
    ShortTerse,
    #[serde(rename = "casual/everyday")]
    CasualEveryday,
    #[serde(rename = "emoji-heavy/expressive")]
    EmojiExpressive,
}

impl StyleLabel {
    pub const ALL: [StyleLabel; 3] = [
        StyleLabel::ShortTerse,
        StyleLabel::CasualEveryday,
        StyleLabel::EmojiExpressive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleLabel::ShortTerse => "short/terse",
            StyleLabel::CasualEveryday => "casual/everyday",
            StyleLabel::EmojiExpressive => "emoji-heavy/expressive",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            StyleLabel::ShortTerse => "short-terse",
            StyleLabel::CasualEveryday => "casual-everyday",
            StyleLabel::EmojiExpressive => "emoji-expressive",
        }
    }

    /// How the label reads inside a reply prompt.
    pub fn prompt_hint(self) -> &'static str {
        match self {
            StyleLabel::ShortTerse => "짧고 간결한 문장 위주",
            StyleLabel::CasualEveryday => "일상적이고 편안한 문장",
            StyleLabel::EmojiExpressive => "이모지와 감정 표현이 풍부한 문장",
        }
    }
}

impl std::fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a sample by its character count.
///
/// `< 50` is short, `[50, 200)` is casual, `>= 200` is expressive.
pub fn classify_style(text: &str) -> StyleLabel {
    let len = text.chars().count();
    if len < SHORT_STYLE_MAX_CHARS {
        StyleLabel::ShortTerse
    } else if len < CASUAL_STYLE_MAX_CHARS {
        StyleLabel::CasualEveryday
    } else {
        StyleLabel::EmojiExpressive
    }
}

/// An ephemeral style profile returned to the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StyleProfile {
    #[serde(rename = "styleId")]
    pub style_id: String,
    pub label: StyleLabel,
}

impl StyleProfile {
    /// Build a profile from a text sample. Blank samples are rejected.
    pub fn from_examples(examples: &str) -> Result<Self> {
        if examples.trim().is_empty() {
            return Err(GatewayError::validation("말투 예시 문장을 입력해 주세요."));
        }
        let label = classify_style(examples);
        Ok(Self {
            style_id: format!("{STYLE_ID_PREFIX}{}-{}", label.slug(), unique_suffix()),
            label,
        })
    }

    /// Recover the label encoded in a style id. `None` for foreign ids.
    pub fn label_from_id(style_id: &str) -> Option<StyleLabel> {
        let rest = style_id.trim().strip_prefix(STYLE_ID_PREFIX)?;
        StyleLabel::ALL.into_iter().find(|label| {
            rest.strip_prefix(label.slug())
                .is_some_and(|tail| tail.starts_with('-'))
        })
    }
}
