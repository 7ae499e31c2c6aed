//! 메트릭 갱신 핸들러.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use mcollect_core::models::MetricRecord;
use serde::Serialize;
use tracing::debug;

use super::parse_json;
use crate::error::ApiError;
use crate::AppState;

/// 배치 갱신 성공 응답
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// 처리 결과
    pub status: &'static str,
}

/// 배치 성공 메시지
pub const BATCH_OK: &str = "batch updated successfully";

/// `POST /update/{type}/{name}/{value}`
///
/// 성공 시 200, 빈 본문.
pub async fn update_from_path(
    State(state): State<AppState>,
    Path((kind, id, value)): Path<(String, String, String)>,
) -> Result<String, ApiError> {
    let record = MetricRecord::parse(&kind, &id, &value)?;
    let merged = state.store.update_metric(&record).await?;
    debug!("경로 갱신: {} = {}", merged.id, merged.render_value());
    Ok(String::new())
}

/// `POST /update/`: 병합 결과를 JSON으로 반환
pub async fn update_json(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MetricRecord>, ApiError> {
    let record: MetricRecord = parse_json(&body)?;
    record.validate()?;
    let merged = state.store.update_metric(&record).await?;
    Ok(Json(merged))
}

/// `POST /updates/`: 빈 배열은 400
///
/// 모든 레코드를 먼저 검증해, 잘못된 레코드가 하나라도 있으면 저장소에 닿지 않는다.
pub async fn update_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchResponse>, ApiError> {
    let records: Vec<MetricRecord> = parse_json(&body)?;
    if records.is_empty() {
        return Err(ApiError::BadRequest("빈 배치".to_string()));
    }
    for record in &records {
        record.validate()?;
    }

    state.store.update_batch(&records).await?;
    debug!("배치 갱신: {}개", records.len());
    Ok(Json(BatchResponse { status: BATCH_OK }))
}
