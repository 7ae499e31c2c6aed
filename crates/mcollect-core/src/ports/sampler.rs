//! 런타임 통계 샘플링 포트.
//!
//! 구현: `mcollect-monitor` crate (`SysInfoSampler`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::MetricSet;

/// 런타임/프로세스 통계 샘플러
#[async_trait]
pub trait RuntimeSampler: Send + Sync {
    /// 고정 목록의 gauge 전체를 현재 값으로 샘플링
    async fn sample(&self) -> Result<MetricSet, CoreError>;
}
