//! 메트릭 전송 포트.
//!
//! 구현: `mcollect-network` crate (`HttpReporter`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::MetricRecord;

/// 메트릭 배치 전송 인터페이스
#[async_trait]
pub trait MetricsReporter: Send + Sync {
    /// 배치 한 건 전송 (재시도 포함)
    ///
    /// 일시적 장애는 내부에서 재시도하고, 소진 시 `RetriesExhausted`를 반환한다.
    /// 서버 거부(2xx 외)는 재시도하지 않는다.
    async fn report(&self, batch: &[MetricRecord]) -> Result<(), CoreError>;
}
