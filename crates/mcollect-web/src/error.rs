//! API 에러 처리.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mcollect_core::error::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 내부 서버 오류
    #[error("내부 서버 오류: {0}")]
    Internal(String),

    /// 리소스를 찾을 수 없음
    #[error("리소스를 찾을 수 없음: {0}")]
    NotFound(String),

    /// 잘못된 요청
    #[error("잘못된 요청: {0}")]
    BadRequest(String),
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl ApiError {
    /// HTTP 상태 코드
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(msg) | ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
        };

        let body = ErrorResponse {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// 코어 에러 → HTTP 에러
///
/// 입력 검증/파싱 실패 → 400, 미발견 → 404, 나머지(저장소 장애 등) → 500.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            e if e.is_validation() => ApiError::BadRequest(e.to_string()),
            e @ CoreError::Serialization(_) => ApiError::BadRequest(e.to_string()),
            e @ CoreError::MetricNotFound(_) => ApiError::NotFound(e.to_string()),
            e => {
                warn!("요청 처리 실패: {e}");
                ApiError::Internal(e.to_string())
            }
        }
    }
}
