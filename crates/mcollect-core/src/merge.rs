//! 메트릭 병합 엔진.
//!
//! - gauge: 마지막 값으로 교체 (last-write-wins)
//! - counter: 기존 누적값 + 증분 (멱등 아님)
//!
//! 저장소 백엔드는 모두 이 함수를 통해 병합해야 동일한 의미를 보장한다.

use crate::error::CoreError;
use crate::models::{MetricKind, MetricRecord, MetricSet};

/// 기존 레코드와 수신 레코드 병합
///
/// 기존 레코드가 다른 종류이면 없는 것으로 취급한다.
pub fn merge(
    current: Option<&MetricRecord>,
    incoming: &MetricRecord,
) -> Result<MetricRecord, CoreError> {
    incoming.validate()?;

    match &incoming.kind {
        MetricKind::Gauge => Ok(incoming.clone()),
        MetricKind::Counter => {
            let delta = incoming
                .delta
                .ok_or_else(|| CoreError::InvalidCounterValue(incoming.id.clone()))?;
            let base = current
                .filter(|c| c.kind == MetricKind::Counter)
                .and_then(|c| c.delta)
                .unwrap_or(0);
            let total = base.checked_add(delta).ok_or_else(|| {
                CoreError::InvalidCounterValue(format!("{}: 누적 오버플로우", incoming.id))
            })?;
            Ok(MetricRecord::counter(incoming.id.clone(), total))
        }
        MetricKind::Other(s) => Err(CoreError::InvalidMetricType(s.clone())),
    }
}

/// 메트릭 집합에 단일 레코드 병합 후 결과 반환
pub fn apply(set: &mut MetricSet, incoming: &MetricRecord) -> Result<MetricRecord, CoreError> {
    let merged = merge(set.get(&incoming.id), incoming)?;
    set.insert(merged.id.clone(), merged.clone());
    Ok(merged)
}

/// 배치를 순서대로 병합
///
/// 중간 실패 시 이미 적용된 레코드는 되돌리지 않는다.
/// 원자성이 필요하면 복사본에 적용한 뒤 교체해야 한다.
pub fn apply_batch(set: &mut MetricSet, batch: &[MetricRecord]) -> Result<(), CoreError> {
    for record in batch {
        apply(set, record)?;
    }
    Ok(())
}
