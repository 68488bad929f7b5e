//! Tone table: maps a user-selected tone key to the phrase used in prompts.
//!
//! The set of tones is closed and fixed at compile time. Lookups never fail;
//! anything that is not an exact key match resolves to [`ToneKey::Default`].

use serde::{Deserialize, Serialize};

/// A situational register used to steer generated text.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToneKey {
    #[default]
    Default,
    Romantic,
    Workplace,
    Friend,
    Family,
}

impl ToneKey {
    /// Every tone, in display order.
    pub const ALL: [ToneKey; 5] = [
        ToneKey::Default,
        ToneKey::Romantic,
        ToneKey::Workplace,
        ToneKey::Friend,
        ToneKey::Family,
    ];

    /// Exact-match lookup. `None` for unknown keys.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "default" => Some(ToneKey::Default),
            "romantic" => Some(ToneKey::Romantic),
            "workplace" => Some(ToneKey::Workplace),
            "friend" => Some(ToneKey::Friend),
            "family" => Some(ToneKey::Family),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToneKey::Default => "default",
            ToneKey::Romantic => "romantic",
            ToneKey::Workplace => "workplace",
            ToneKey::Friend => "friend",
            ToneKey::Family => "family",
        }
    }

    /// The natural-language description interpolated into prompts.
    pub fn description(self) -> &'static str {
        match self {
            ToneKey::Default => "상황에 맞는 자연스럽고 무난한 말투",
            ToneKey::Romantic => "썸 타는 상대나 연인에게 설렘이 느껴지는 다정한 말투",
            ToneKey::Workplace => "직장 동료나 상사에게 예의 바르고 깔끔한 존댓말",
            ToneKey::Friend => "친한 친구에게 쓰는 편하고 장난스러운 반말",
            ToneKey::Family => "가족에게 쓰는 따뜻하고 편안한 말투",
        }
    }
}

impl std::fmt::Display for ToneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a tone key (possibly absent) to its prompt description.
pub fn resolve(key: Option<&str>) -> &'static str {
    key.and_then(ToneKey::parse)
        .unwrap_or_default()
        .description()
}
