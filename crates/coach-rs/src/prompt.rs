//! Prompt construction for every gateway operation.
//!
//! User prompts are assembled with [`PromptBuilder`], which numbers input
//! fields and substitutes [`NO_INFORMATION`] for missing ones, so a prompt has
//! the same sections no matter which fields the client filled in. Free text
//! is interpolated as-is.

use serde::{Deserialize, Serialize};

use crate::style::StyleProfile;

/// Placeholder for an absent or blank optional field.
pub const NO_INFORMATION: &str = "정보 없음";

/// The sentence every skin analysis must end with.
pub const PROFESSIONAL_REFERRAL: &str = "정확한 진단과 치료는 피부과 전문의와 상담하세요.";

/// Separator between the four fields of a reply line.
pub const REPLY_FIELD_DELIMITER: &str = "||";

/// Number of candidates requested by the reply prompt.
pub const REPLY_CANDIDATE_COUNT: usize = 3;

/// The one-line layout the model must follow for each candidate.
pub const REPLY_LINE_FORMAT: &str =
    "문장 || 위험도 점수 · 한줄 평가 || 센스 점수 · 한줄 평가 || 한 줄 코멘트";

const REPLY_LINE_EXAMPLE: &str =
    "오늘은 집에서 좀 쉬려고! 너는 뭐해? || 10 · 안전 || 65 · 무난함 || 가볍게 되묻는 답장";

const SAFETY_RULE: &str = "욕설, 비속어, 비하·혐오 표현, 폭력적인 내용은 절대 포함하지 마세요.";

/// System prompt for the reply and fix paths.
pub const COACH_SYSTEM_PROMPT: &str = "\
너는 메시지 답장을 도와주는 대화 코치야. 요청한 출력 형식을 정확히 지켜서 한국어로만 답해. \
설명이나 머리말은 붙이지 마. 욕설, 비하 표현, 폭력적인 표현은 어떤 경우에도 쓰지 마.";

/// Safety-oriented system prompt for skin analysis (text or image).
pub fn skin_system_prompt() -> String {
    format!(
        "\
너는 피부 관리 코치 역할을 하는 AI야. 사용자가 알려준 정보나 사진을 바탕으로 피부 상태의 \
경향을 설명하고 생활 속 관리 방법을 제안해.

반드시 지켜야 할 규칙:
- 이 분석은 의학적 진단이 아니야. 질환을 진단하거나 치료법·약을 처방하지 마.
- 특정 질환명이나 병명을 단정적으로 말하지 말고 \"경향\", \"패턴\", \"가능성\" 같은 완곡한 표현을 사용해.
- 불안감이나 공포심을 주는 표현은 쓰지 말고 차분하고 긍정적인 어조를 유지해.
- 답변의 마지막 줄에는 반드시 다음 문장을 그대로 적어: \"{PROFESSIONAL_REFERRAL}\"
- 한국어로 답해."
    )
}

// ── Inputs ─────────────────────────────────────────────────────────

/// Skin concerns as sent by the client: a list or a single string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Concerns {
    Many(Vec<String>),
    One(String),
}

impl Concerns {
    /// Comma-joined display string, insertion order kept, blanks dropped.
    pub fn joined(&self) -> String {
        match self {
            Concerns::Many(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Concerns::One(s) => s.trim().to_string(),
        }
    }
}

/// Structured description of the subject of a skin analysis.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default)]
    pub concerns: Option<Concerns>,
    #[serde(default)]
    pub problem_area: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

impl AnalysisRequest {
    /// True when none of the descriptive fields carry any text.
    pub fn is_empty(&self) -> bool {
        is_blank(self.skin_type.as_deref())
            && self.concerns.as_ref().is_none_or(|c| c.joined().is_empty())
            && is_blank(self.problem_area.as_deref())
            && is_blank(self.notes.as_deref())
    }
}

/// Optional hints for the reply prompt.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyOptions {
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, rename = "styleId")]
    pub style_id: Option<String>,
}

impl ReplyOptions {
    /// Prompt hint for the writing style encoded in `style_id`, if any.
    fn style_hint(&self) -> Option<&'static str> {
        self.style_id
            .as_deref()
            .and_then(StyleProfile::label_from_id)
            .map(|label| label.prompt_hint())
    }
}

/// System and user prompt pair for one analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

// ── Builder ────────────────────────────────────────────────────────

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Line-oriented builder for user prompts with numbered input fields.
///
/// ```
/// use coach_rs::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("Describe the subject.")
///     .field("Name", Some("Kim"))
///     .field("Notes", None)
///     .raw("Answer in one line.")
///     .build();
///
/// assert_eq!(
///     prompt,
///     "Describe the subject.\n1) Name: Kim\n2) Notes: 정보 없음\nAnswer in one line."
/// );
/// ```
pub struct PromptBuilder {
    lines: Vec<String>,
    next_number: usize,
}

impl PromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            lines: vec![preamble.into()],
            next_number: 1,
        }
    }

    /// Append a numbered field. Blank or absent values become [`NO_INFORMATION`].
    pub fn field(mut self, label: &str, value: Option<&str>) -> Self {
        let value = match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => NO_INFORMATION,
        };
        self.lines
            .push(format!("{}) {label}: {value}", self.next_number));
        self.next_number += 1;
        self
    }

    /// Append a line verbatim. Skipped if empty.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.lines.push(content);
        }
        self
    }

    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

// ── Prompts ────────────────────────────────────────────────────────

/// Prompts for a text-only skin analysis.
pub fn build_analysis_prompt(subject: &AnalysisRequest, tone_description: &str) -> AnalysisPrompt {
    let concerns = subject.concerns.as_ref().map(Concerns::joined);
    let user = PromptBuilder::new("아래 정보를 바탕으로 피부 상태를 분석해 주세요.")
        .field("피부 타입", subject.skin_type.as_deref())
        .field("고민 부위", subject.problem_area.as_deref())
        .field("선택한 고민", concerns.as_deref())
        .field("추가 메모", subject.notes.as_deref())
        .field("설명 말투", Some(tone_description))
        .raw("다음 순서로 8줄 이내로 정리해 주세요: 전체 요약 → 부위별 경향 → 관리 팁")
        .raw(format!("마지막 줄: {PROFESSIONAL_REFERRAL}"))
        .build();
    AnalysisPrompt {
        system: skin_system_prompt(),
        user,
    }
}

/// Prompts for a photo-based skin analysis. The image itself travels as a
/// separate content part next to `user`.
pub fn build_image_analysis_prompt(tone_description: &str) -> AnalysisPrompt {
    let user = PromptBuilder::new("이 얼굴 사진의 피부 상태를 분석해 주세요.")
        .field("설명 말투", Some(tone_description))
        .raw("다음 순서로 8줄 이내로 정리해 주세요: 전체 요약 → 문제 부위 → 관리 팁")
        .raw(format!("마지막 줄: {PROFESSIONAL_REFERRAL}"))
        .build();
    AnalysisPrompt {
        system: skin_system_prompt(),
        user,
    }
}

/// Prompt asking for three stylistically distinct reply candidates.
pub fn build_reply_prompt(message: &str, tone_description: &str, options: &ReplyOptions) -> String {
    PromptBuilder::new("상대방이 보낸 메시지에 보낼 답장 후보를 만들어 주세요.")
        .field("받은 메시지", Some(message))
        .field("말투", Some(tone_description))
        .field("답장 길이", options.length.as_deref())
        .field("대화 모드", options.mode.as_deref())
        .field("평소 문체", options.style_hint())
        .raw(format!(
            "서로 다른 스타일의 답장 후보를 정확히 {REPLY_CANDIDATE_COUNT}개 만들어 주세요."
        ))
        .raw("- 첫 번째: 예의 바르고 무난한 답장")
        .raw("- 두 번째: 직설적이고 솔직한 답장")
        .raw("- 세 번째: 감정이 담겨 있지만 공격적이지 않은 답장")
        .raw("각 후보는 한 줄로 아래 형식을 정확히 지켜 주세요. 번호, 설명, 빈 줄 없이 3줄만 출력하세요.")
        .raw(REPLY_LINE_FORMAT)
        .raw(format!("예시: {REPLY_LINE_EXAMPLE}"))
        .raw(SAFETY_RULE)
        .build()
}

/// Prompt asking for one lower-risk rewrite of `text`.
pub fn build_fix_prompt(text: &str, tone_description: &str) -> String {
    PromptBuilder::new(
        "아래 문장을 원래 의미는 그대로 유지하면서, 상대가 받아들일 때 위험도가 더 낮게 느껴지도록 한 줄로 다시 써 주세요.",
    )
    .field("원래 문장", Some(text))
    .field("말투", Some(tone_description))
    .raw("설명 없이 아래 형식의 한 줄만 출력하세요.")
    .raw(REPLY_LINE_FORMAT)
    .raw(SAFETY_RULE)
    .build()
}
