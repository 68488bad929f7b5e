//! Text recognition for screenshots of a conversation.
//!
//! Recognition is not implemented yet. [`NotReadyOcr`] sits behind the
//! [`OcrEngine`] trait and answers every request with [`OCR_NOT_READY`], so a
//! real engine can be swapped in without touching the HTTP layer.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Message returned while recognition is unavailable.
pub const OCR_NOT_READY: &str =
    "이미지 속 글자 인식 기능은 아직 준비 중입니다. 메시지를 직접 입력해 주세요.";

/// Boxed future returned by [`OcrEngine::recognize`].
pub type OcrFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// An uploaded image handed to an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Extracts text from an image.
///
/// Uses a boxed future so the trait stays dyn-compatible.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: OcrImage) -> OcrFuture<'_>;
}

/// Placeholder engine that always reports the feature as not ready.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotReadyOcr;

impl OcrEngine for NotReadyOcr {
    fn recognize(&self, image: OcrImage) -> OcrFuture<'_> {
        Box::pin(async move {
            tracing::debug!(
                "OCR requested for {} bytes ({}), engine not ready",
                image.bytes.len(),
                image.content_type.as_deref().unwrap_or("unknown type"),
            );
            Ok(OCR_NOT_READY.to_string())
        })
    }
}
