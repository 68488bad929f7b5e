//! JSON endpoint handlers.
//!
//! Handlers are thin: they pull the body apart, call one [`Gateway`]
//! operation and shape the response. Every failure goes through
//! [`ApiError`].

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use coach_rs::gateway::Gateway;
use coach_rs::normalize::{MalformedLine, ReplyRecord};
use coach_rs::ocr::{NotReadyOcr, OcrEngine, OcrImage};
use coach_rs::prompt::{AnalysisRequest, ReplyOptions};
use coach_rs::style::StyleProfile;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;

/// Relative path of the product list under the static root.
pub(crate) const PRODUCTS_PATH: &str = "data/coupang-links.json";

/// Multipart field carrying the uploaded screenshot.
const OCR_FIELD: &str = "image";

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub ocr: Arc<dyn OcrEngine>,
    /// Root for `/api/products`. Unset means the product list is unavailable.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    /// State with the not-ready OCR stub and no static root.
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            ocr: Arc::new(NotReadyOcr),
            static_dir: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }
}

// ── Analyze ────────────────────────────────────────────────────────

/// Request body for POST /analyze.
#[derive(Deserialize, Debug, Default)]
pub struct AnalyzeBody {
    /// Base64 data URL of a photo. Takes precedence over the fields below.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub subject: AnalysisRequest,
}

/// Image analysis answers with `result`, field analysis with `analysis`.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub enum AnalyzeResponse {
    #[serde(rename = "result")]
    Result(String),
    #[serde(rename = "analysis")]
    Analysis(String),
}

/// POST /analyze and POST /api/analyze.
pub async fn post_analyze(
    State(app): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(body) = body?;
    let response = match body.image.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(image) => {
            info!("Analyze request with image ({} bytes)", image.len());
            let text = app
                .gateway
                .analyze_image(image, body.subject.tone.as_deref())
                .await?;
            AnalyzeResponse::Result(text)
        }
        None => {
            info!("Analyze request with structured fields");
            AnalyzeResponse::Analysis(app.gateway.analyze_subject(&body.subject).await?)
        }
    };
    Ok(Json(response))
}

// ── Reply / fix ────────────────────────────────────────────────────

/// Request body for POST /reply.
#[derive(Deserialize, Debug, Default)]
pub struct ReplyBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(flatten)]
    pub options: ReplyOptions,
}

#[derive(Serialize, Debug)]
pub struct ReplyResponse {
    /// Raw completion text, one candidate per line.
    pub reply: String,
    pub replies: Vec<ReplyRecord>,
    pub malformed: Vec<MalformedLine>,
}

/// POST /reply: three reply candidates.
pub async fn post_reply(
    State(app): State<AppState>,
    body: Result<Json<ReplyBody>, JsonRejection>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let Json(body) = body?;
    let batch = app
        .gateway
        .generate_replies(&body.text, body.tone.as_deref(), &body.options)
        .await?;
    debug!(
        "Reply: {} candidates, {} malformed",
        batch.replies.len(),
        batch.malformed.len()
    );
    Ok(Json(ReplyResponse {
        reply: batch.raw,
        replies: batch.replies,
        malformed: batch.malformed,
    }))
}

/// Request body for POST /fix.
#[derive(Deserialize, Debug, Default)]
pub struct FixBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct FixResponse {
    pub fixed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ReplyRecord>,
}

/// POST /fix: one lower-risk rewrite.
pub async fn post_fix(
    State(app): State<AppState>,
    body: Result<Json<FixBody>, JsonRejection>,
) -> Result<Json<FixResponse>, ApiError> {
    let Json(body) = body?;
    let fixed = app
        .gateway
        .fix_reply(&body.text, body.tone.as_deref())
        .await?;
    Ok(Json(FixResponse {
        fixed: fixed.line,
        record: fixed.record,
    }))
}

// ── OCR ────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct OcrResponse {
    pub text: String,
}

/// POST /ocr: multipart upload, file field `image`.
pub async fn post_ocr(
    State(app): State<AppState>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<OcrResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(OCR_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            break;
        }
        let text = app
            .ocr
            .recognize(OcrImage {
                bytes: bytes.to_vec(),
                content_type,
                file_name,
            })
            .await?;
        return Ok(Json(OcrResponse { text }));
    }
    Err(ApiError::BadRequest("이미지 파일이 필요합니다.".into()))
}

// ── Style ──────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
pub struct StyleBody {
    #[serde(default)]
    pub examples: String,
}

/// POST /style: classify a writing sample.
pub async fn post_style(
    State(app): State<AppState>,
    body: Result<Json<StyleBody>, JsonRejection>,
) -> Result<Json<StyleProfile>, ApiError> {
    let Json(body) = body?;
    Ok(Json(app.gateway.profile_style(&body.examples)?))
}

// ── Products ───────────────────────────────────────────────────────

/// GET /api/products: the product list shipped with the static files.
pub async fn get_products(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let not_found = || ApiError::NotFound("상품 목록이 없습니다.".into());
    let path = app.static_dir.as_ref().ok_or_else(not_found)?.join(PRODUCTS_PATH);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    let value = serde_json::from_str(&raw)
        .map_err(|e| ApiError::Internal(format!("invalid JSON in {}: {e}", path.display())))?;
    Ok(Json(value))
}
