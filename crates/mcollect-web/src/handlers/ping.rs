//! 저장소 생존 확인 핸들러.

use axum::extract::State;
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::AppState;

/// `GET /ping`: 저장소 응답 시 200, 실패 시 500
pub async fn ping(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::Internal(format!("저장소 응답 없음: {e}")))?;
    Ok(StatusCode::OK)
}
