//! 메트릭 저장소 포트.
//!
//! 구현: `mcollect-storage` crate (`MemStorage`, `SqliteStore`)
//!
//! 두 백엔드는 같은 병합 의미(`crate::merge`)를 가지며,
//! 영속성과 재시도 동작만 다르다.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::models::{MetricRecord, MetricSet};

/// 서버측 메트릭 저장소
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// 단일 레코드 병합 후 저장, 병합 결과 반환
    async fn update_metric(&self, record: &MetricRecord) -> Result<MetricRecord, CoreError>;

    /// 배치 병합 (원자성은 백엔드에 따름)
    async fn update_batch(&self, records: &[MetricRecord]) -> Result<(), CoreError>;

    /// id로 조회 (없으면 `MetricNotFound`)
    async fn get_metric(&self, id: &str) -> Result<MetricRecord, CoreError>;

    /// 전체 gauge 스냅샷
    async fn get_all_gauges(&self) -> Result<BTreeMap<String, f64>, CoreError>;

    /// 전체 counter 스냅샷
    async fn get_all_counters(&self) -> Result<BTreeMap<String, i64>, CoreError>;

    /// 백엔드 생존 확인
    async fn ping(&self) -> Result<(), CoreError>;

    /// 전체 레코드 스냅샷 (백업용)
    async fn snapshot(&self) -> Result<MetricSet, CoreError>;

    /// 스냅샷 레코드를 그대로 적재 (병합 없이 덮어쓰기)
    async fn restore(&self, set: MetricSet) -> Result<(), CoreError>;

    /// 백엔드 이름 (로그용)
    fn backend_name(&self) -> &'static str;

    /// 자체 영속 백엔드 여부 (파일 백업 불필요, `/ping` 노출)
    fn is_durable(&self) -> bool;
}
