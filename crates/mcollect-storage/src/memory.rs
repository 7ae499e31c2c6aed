//! 인메모리 저장소.
//!
//! 단일 RwLock으로 보호되는 id → 레코드 맵. 변경은 쓰기 잠금으로 직렬화되고,
//! 읽기는 동시에 진행된다. 배치는 한 번의 쓰기 잠금 안에서 적용하지만
//! 중간 실패 시 되돌리지 않는다.

use async_trait::async_trait;
use mcollect_core::error::CoreError;
use mcollect_core::merge;
use mcollect_core::models::{MetricKind, MetricRecord, MetricSet};
use mcollect_core::ports::store::MetricsStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 인메모리 저장소: `MetricsStore` 포트 구현
#[derive(Default)]
pub struct MemStorage {
    metrics: RwLock<MetricSet>,
}

impl MemStorage {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 레코드 수
    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    /// 비어 있는지
    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }
}

#[async_trait]
impl MetricsStore for MemStorage {
    async fn update_metric(&self, record: &MetricRecord) -> Result<MetricRecord, CoreError> {
        let mut metrics = self.metrics.write();
        merge::apply(&mut metrics, record)
    }

    async fn update_batch(&self, records: &[MetricRecord]) -> Result<(), CoreError> {
        let mut metrics = self.metrics.write();
        merge::apply_batch(&mut metrics, records).map_err(|e| {
            warn!("배치 적용 중 실패 (이미 적용된 레코드는 유지): {e}");
            e
        })?;
        debug!("배치 적용: {}개", records.len());
        Ok(())
    }

    async fn get_metric(&self, id: &str) -> Result<MetricRecord, CoreError> {
        self.metrics
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::MetricNotFound(id.to_string()))
    }

    async fn get_all_gauges(&self) -> Result<BTreeMap<String, f64>, CoreError> {
        Ok(self
            .metrics
            .read()
            .values()
            .filter(|r| r.kind == MetricKind::Gauge)
            .filter_map(|r| r.value.map(|v| (r.id.clone(), v)))
            .collect())
    }

    async fn get_all_counters(&self) -> Result<BTreeMap<String, i64>, CoreError> {
        Ok(self
            .metrics
            .read()
            .values()
            .filter(|r| r.kind == MetricKind::Counter)
            .filter_map(|r| r.delta.map(|d| (r.id.clone(), d)))
            .collect())
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<MetricSet, CoreError> {
        Ok(self.metrics.read().clone())
    }

    async fn restore(&self, set: MetricSet) -> Result<(), CoreError> {
        for record in set.values() {
            record.validate()?;
        }
        let mut metrics = self.metrics.write();
        metrics.extend(set);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_durable(&self) -> bool {
        false
    }
}
