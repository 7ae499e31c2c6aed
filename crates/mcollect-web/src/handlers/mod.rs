//! HTTP 핸들러 모듈.
//!
//! 핸들러는 경로/본문 파싱과 검증만 담당하고, 병합은 저장소에 위임한다.

pub mod listing;
pub mod ping;
pub mod update;
pub mod value;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use mcollect_core::error::CoreError;

/// JSON 본문 파싱 (Content-Type 헤더는 요구하지 않음)
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::from(CoreError::from(e)))
}
