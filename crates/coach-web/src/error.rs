//! Mapping from failures to JSON error responses.
//!
//! Every failure leaves the server as `{"error": "..."}` with an HTTP status;
//! upstream failures also carry the upstream `status` and `detail`. Internal
//! error text is logged and never sent to the client.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coach_rs::error::GatewayError;
use serde::Serialize;
use tracing::error;

/// Response body for every failed request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug)]
pub enum ApiError {
    Gateway(GatewayError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError::Gateway(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!(
            "요청 본문을 읽을 수 없습니다: {}",
            rejection.body_text()
        ))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!(
            "multipart 요청이 아닙니다: {}",
            rejection.body_text()
        ))
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadRequest(format!("업로드를 읽을 수 없습니다: {}", e.body_text()))
    }
}

impl ApiError {
    /// Status code and body for this error.
    pub fn parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Gateway(GatewayError::Validation(msg)) | ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(msg.clone()))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(msg.clone())),
            ApiError::Gateway(GatewayError::Upstream { status, detail }) => {
                error!("Upstream API error: HTTP {status}: {detail}");
                let mut body = ErrorBody::new("AI API 호출 실패").with_detail(detail.clone());
                body.status = Some(*status);
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            ApiError::Gateway(e @ GatewayError::Transport(_)) => {
                error!("Upstream transport error: {e}");
                let detail = if e.is_timeout() {
                    "AI 응답 시간이 초과되었습니다."
                } else {
                    "AI 서버에 연결하지 못했습니다."
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("AI API 호출 실패").with_detail(detail),
                )
            }
            ApiError::Gateway(GatewayError::Config(msg)) => {
                error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("서버 설정 오류").with_detail(msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("서버 내부 오류"),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked.
pub(crate) fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    ApiError::Internal("handler panicked".into()).into_response()
}
