//! The operations exposed to the HTTP layer.
//!
//! Each [`Gateway`] method is one request: validate input, resolve the tone,
//! build prompts, make a single upstream call through the injected
//! [`ChatBackend`], and normalize the result. The gateway holds no mutable
//! state and is shared behind an `Arc`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, info_span, warn};

use crate::api::generate_request_id;
use crate::config::{DEFAULT_MODEL, DEFAULT_VISION_MODEL, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::normalize::{
    FALLBACK_TEXT, MalformedLine, ReplyRecord, extract_text, first_line, parse_reply_line,
    parse_reply_lines,
};
use crate::prompt::{
    AnalysisRequest, COACH_SYSTEM_PROMPT, REPLY_CANDIDATE_COUNT, ReplyOptions,
    build_analysis_prompt, build_fix_prompt, build_image_analysis_prompt, build_reply_prompt,
};
use crate::style::StyleProfile;
use crate::{ChatBackend, ChatRequest, Message, OpenAiClient, tone};

/// Model parameters applied to every upstream call.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 0,
        }
    }
}

impl From<&GatewayConfig> for CompletionSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Reply candidates produced for one message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReplyBatch {
    /// The completion text (or the fallback string), one candidate per line.
    pub raw: String,
    pub replies: Vec<ReplyRecord>,
    pub malformed: Vec<MalformedLine>,
}

impl ReplyBatch {
    pub fn from_text(raw: String) -> Self {
        let mut replies = Vec::new();
        let mut malformed = Vec::new();
        for parsed in parse_reply_lines(&raw) {
            match parsed {
                Ok(record) => replies.push(record),
                Err(bad) => {
                    warn!("Malformed reply {bad}");
                    malformed.push(bad);
                }
            }
        }
        if replies.len() != REPLY_CANDIDATE_COUNT {
            warn!(
                "Expected {REPLY_CANDIDATE_COUNT} reply candidates, got {}",
                replies.len()
            );
        }
        Self {
            raw,
            replies,
            malformed,
        }
    }
}

/// A single lower-risk rewrite.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FixedReply {
    /// The first non-blank line of the completion.
    pub line: String,
    /// The line split into fields, when it has exactly four.
    pub record: Option<ReplyRecord>,
}

impl FixedReply {
    pub fn from_text(text: &str) -> Self {
        let line = first_line(text).unwrap_or(FALLBACK_TEXT).to_string();
        let record = parse_reply_line(1, &line).ok();
        Self { line, record }
    }
}

/// Tone resolver → prompt builder → upstream call → normalizer.
pub struct Gateway {
    backend: Arc<dyn ChatBackend>,
    settings: CompletionSettings,
}

impl Gateway {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: CompletionSettings) -> Self {
        Self { backend, settings }
    }

    /// Build a gateway backed by an [`OpenAiClient`].
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = OpenAiClient::new(config)?;
        Ok(Self::new(Arc::new(client), CompletionSettings::from(config)))
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    async fn complete_text(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        };
        let completion = self.backend.complete(request).await?;
        Ok(extract_text(&completion))
    }

    /// Skin analysis from structured fields.
    pub async fn analyze_subject(&self, subject: &AnalysisRequest) -> Result<String> {
        if subject.is_empty() {
            return Err(GatewayError::validation(
                "이미지 또는 피부 정보가 전달되지 않았습니다.",
            ));
        }
        let tone = tone::resolve(subject.tone.as_deref());
        let prompt = build_analysis_prompt(subject, tone);
        let span = info_span!("analyze_subject", request_id = %generate_request_id());
        self.complete_text(
            &self.settings.model,
            vec![Message::system(prompt.system), Message::user(prompt.user)],
        )
        .instrument(span)
        .await
    }

    /// Skin analysis from a base64 data URL.
    pub async fn analyze_image(&self, image_data_url: &str, tone: Option<&str>) -> Result<String> {
        let image = image_data_url.trim();
        if image.is_empty() {
            return Err(GatewayError::validation("이미지가 전달되지 않았습니다."));
        }
        let prompt = build_image_analysis_prompt(tone::resolve(tone));
        let span = info_span!(
            "analyze_image",
            request_id = %generate_request_id(),
            image_bytes = image.len()
        );
        self.complete_text(
            &self.settings.vision_model,
            vec![
                Message::system(prompt.system),
                Message::user_with_image(prompt.user, image),
            ],
        )
        .instrument(span)
        .await
    }

    /// Three reply candidates for an incoming message.
    pub async fn generate_replies(
        &self,
        text: &str,
        tone: Option<&str>,
        options: &ReplyOptions,
    ) -> Result<ReplyBatch> {
        if text.trim().is_empty() {
            return Err(GatewayError::validation("답장할 메시지를 입력해 주세요."));
        }
        let prompt = build_reply_prompt(text, tone::resolve(tone), options);
        let span = info_span!("generate_replies", request_id = %generate_request_id());
        let raw = self
            .complete_text(
                &self.settings.model,
                vec![Message::system(COACH_SYSTEM_PROMPT), Message::user(prompt)],
            )
            .instrument(span)
            .await?;
        Ok(ReplyBatch::from_text(raw))
    }

    /// One lower-risk rewrite of `text`.
    pub async fn fix_reply(&self, text: &str, tone: Option<&str>) -> Result<FixedReply> {
        if text.trim().is_empty() {
            return Err(GatewayError::validation("다듬을 문장을 입력해 주세요."));
        }
        let prompt = build_fix_prompt(text, tone::resolve(tone));
        let span = info_span!("fix_reply", request_id = %generate_request_id());
        let raw = self
            .complete_text(
                &self.settings.model,
                vec![Message::system(COACH_SYSTEM_PROMPT), Message::user(prompt)],
            )
            .instrument(span)
            .await?;
        Ok(FixedReply::from_text(&raw))
    }

    /// Classify a writing sample. No upstream call is made.
    pub fn profile_style(&self, examples: &str) -> Result<StyleProfile> {
        StyleProfile::from_examples(examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::UpstreamCompletion;
    use crate::prompt::skin_system_prompt;
    use crate::{CompletionFuture, MessageContent};
    use serde_json::json;
    use std::sync::Mutex;

    /// Backend that records requests and answers with a canned body.
    struct CannedBackend {
        response: std::result::Result<serde_json::Value, (u16, String)>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl CannedBackend {
        fn text(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(json!({"choices": [{"message": {"content": text}}]})),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn body(value: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(value),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16, detail: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err((status, detail.to_string())),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> ChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl ChatBackend for CannedBackend {
        fn complete(&self, request: ChatRequest) -> CompletionFuture<'_> {
            self.requests.lock().unwrap().push(request);
            let response = self.response.clone();
            Box::pin(async move {
                response
                    .map(UpstreamCompletion)
                    .map_err(|(status, detail)| GatewayError::Upstream { status, detail })
            })
        }
    }

    fn gateway(backend: Arc<CannedBackend>) -> Gateway {
        Gateway::new(backend, CompletionSettings::default())
    }

    const THREE_LINES: &str = "나 집에서 쉬는 중! 너는? || 10 · 안전 || 60 · 무난 || 되묻기\n\
                               그냥 있어 || 35 · 보통 || 40 · 담백 || 직설\n\
                               너 생각하고 있었지 || 50 · 주의 || 85 · 센스 || 감성";

    #[tokio::test]
    async fn replies_are_parsed_into_records() {
        let backend = CannedBackend::text(THREE_LINES);
        let batch = gateway(backend.clone())
            .generate_replies("오늘 뭐해?", None, &ReplyOptions::default())
            .await
            .unwrap();
        assert_eq!(batch.replies.len(), 3);
        assert!(batch.malformed.is_empty());
        assert_eq!(batch.raw, THREE_LINES);
        assert_eq!(batch.replies[1].sentence, "그냥 있어");

        let request = backend.last_request();
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content.text(), COACH_SYSTEM_PROMPT);
        assert!(request.messages[1].content.text().contains("오늘 뭐해?"));
        assert!(
            request.messages[1]
                .content
                .text()
                .contains(tone::resolve(None))
        );
    }

    #[tokio::test]
    async fn malformed_lines_are_reported_not_dropped() {
        let backend = CannedBackend::text("a || b || c || d\nbroken || line\n");
        let batch = gateway(backend)
            .generate_replies("hi", Some("friend"), &ReplyOptions::default())
            .await
            .unwrap();
        assert_eq!(batch.replies.len(), 1);
        assert_eq!(batch.malformed.len(), 1);
        assert_eq!(batch.malformed[0].field_count, 2);
    }

    #[tokio::test]
    async fn unrecognized_completion_becomes_fallback() {
        let backend = CannedBackend::body(json!({"unexpected": true}));
        let batch = gateway(backend)
            .generate_replies("hi", None, &ReplyOptions::default())
            .await
            .unwrap();
        assert_eq!(batch.raw, FALLBACK_TEXT);
        assert!(batch.replies.is_empty());
        assert_eq!(batch.malformed.len(), 1);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_upstream() {
        let backend = CannedBackend::text(THREE_LINES);
        let gw = gateway(backend.clone());
        let err = gw
            .generate_replies("  ", None, &ReplyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        let err = gw.fix_reply("", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let backend = CannedBackend::failing(401, "Incorrect API key");
        let err = gateway(backend)
            .generate_replies("hi", None, &ReplyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn fix_takes_first_line() {
        let backend = CannedBackend::text("\n이번엔 조금 늦을 것 같아 미안해 || 15 · 안전 || 55 · 무난 || 사과 포함\n추가 설명");
        let fixed = gateway(backend.clone())
            .fix_reply("왜 맨날 늦어", Some("workplace"))
            .await
            .unwrap();
        assert_eq!(
            fixed.line,
            "이번엔 조금 늦을 것 같아 미안해 || 15 · 안전 || 55 · 무난 || 사과 포함"
        );
        assert_eq!(
            fixed.record.unwrap().sentence,
            "이번엔 조금 늦을 것 같아 미안해"
        );
        let prompt = backend.last_request().messages[1].content.text();
        assert!(prompt.contains("왜 맨날 늦어"));
        assert!(prompt.contains(tone::resolve(Some("workplace"))));
    }

    #[tokio::test]
    async fn fix_without_delimiters_has_no_record() {
        let backend = CannedBackend::text("그냥 한 줄");
        let fixed = gateway(backend).fix_reply("x", None).await.unwrap();
        assert_eq!(fixed.line, "그냥 한 줄");
        assert!(fixed.record.is_none());
    }

    #[tokio::test]
    async fn subject_analysis_uses_safety_prompt() {
        let backend = CannedBackend::body(json!({
            "output": [{"content": [{"text": "건조한 경향이 보여요."}]}]
        }));
        let subject = AnalysisRequest {
            skin_type: Some("건성".into()),
            ..Default::default()
        };
        let text = gateway(backend.clone())
            .analyze_subject(&subject)
            .await
            .unwrap();
        assert_eq!(text, "건조한 경향이 보여요.");
        let request = backend.last_request();
        assert_eq!(request.messages[0].content.text(), skin_system_prompt());
        assert_eq!(request.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        let backend = CannedBackend::text("x");
        let err = gateway(backend.clone())
            .analyze_subject(&AnalysisRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn image_analysis_uses_vision_model_and_image_part() {
        let backend = CannedBackend::text("요약");
        let text = gateway(backend.clone())
            .analyze_image("data:image/jpeg;base64,/9j/4AAQ", None)
            .await
            .unwrap();
        assert_eq!(text, "요약");
        let request = backend.last_request();
        assert_eq!(request.model, DEFAULT_VISION_MODEL);
        match &request.messages[1].content {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_image_is_rejected() {
        let backend = CannedBackend::text("x");
        let err = gateway(backend)
            .analyze_image(" ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn style_profile_needs_no_upstream() {
        let backend = CannedBackend::text("x");
        let profile = gateway(backend.clone()).profile_style("hi").unwrap();
        assert_eq!(profile.label.as_str(), "short/terse");
        assert_eq!(backend.request_count(), 0);
    }
}
