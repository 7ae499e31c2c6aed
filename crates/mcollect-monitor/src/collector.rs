//! 에이전트측 메트릭 수집기.
//!
//! 매 수집 주기마다 샘플러 gauge + `RandomValue`로 스냅샷을 통째로 교체하고,
//! `PollCount`는 마지막 전송 성공 이후 누적된 수집 횟수(증분)로 보고한다.

use mcollect_core::error::CoreError;
use mcollect_core::models::{MetricRecord, MetricSet};
use mcollect_core::ports::sampler::RuntimeSampler;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 난수 gauge 이름
pub const RANDOM_VALUE: &str = "RandomValue";

/// 수집 횟수 counter 이름
pub const POLL_COUNT: &str = "PollCount";

/// 전송 단위 배치
#[derive(Debug, Clone, Default)]
pub struct ReportBatch {
    /// 전송할 레코드
    pub records: Vec<MetricRecord>,
    /// 이 배치에 포함된 미확인 수집 횟수
    pub polls: i64,
}

impl ReportBatch {
    /// 전송할 레코드가 없는지
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 메트릭 수집기
///
/// 스냅샷은 RwLock으로 보호한다. 수집은 쓰기 잠금으로 교체,
/// 전송은 읽기 잠금으로 복사만 한다.
pub struct MetricsCollector {
    sampler: Arc<dyn RuntimeSampler>,
    snapshot: RwLock<MetricSet>,
    /// 프로세스 수명 동안의 총 수집 횟수
    poll_total: AtomicI64,
    /// 전송 성공으로 확인되지 않은 수집 횟수
    pending_polls: AtomicI64,
}

impl MetricsCollector {
    /// 새 수집기 생성
    pub fn new(sampler: Arc<dyn RuntimeSampler>) -> Self {
        Self {
            sampler,
            snapshot: RwLock::new(MetricSet::new()),
            poll_total: AtomicI64::new(0),
            pending_polls: AtomicI64::new(0),
        }
    }

    /// 1회 수집
    ///
    /// 샘플링에 실패하면 스냅샷과 수집 횟수는 그대로 둔다.
    pub async fn collect(&self) -> Result<MetricSet, CoreError> {
        let mut set = self.sampler.sample().await?;
        set.insert(
            RANDOM_VALUE.to_string(),
            MetricRecord::gauge(RANDOM_VALUE, rand::random::<f64>()),
        );

        let total = self.poll_total.fetch_add(1, Ordering::SeqCst) + 1;
        let pending = self.pending_polls.fetch_add(1, Ordering::SeqCst) + 1;
        set.insert(
            POLL_COUNT.to_string(),
            MetricRecord::counter(POLL_COUNT, pending),
        );

        *self.snapshot.write() = set.clone();
        debug!("수집 완료: {}개 메트릭, poll #{total}", set.len());
        Ok(set)
    }

    /// 현재 스냅샷으로 전송 배치 구성
    ///
    /// `PollCount`는 읽는 시점의 미확인 수집 횟수로 채운다 (0이면 생략).
    pub fn batch(&self) -> ReportBatch {
        let polls = self.pending_polls.load(Ordering::SeqCst);
        let mut records: Vec<MetricRecord> = {
            let snapshot = self.snapshot.read();
            snapshot
                .values()
                .filter(|r| r.id != POLL_COUNT)
                .cloned()
                .collect()
        };

        if polls > 0 {
            records.push(MetricRecord::counter(POLL_COUNT, polls));
        }

        ReportBatch { records, polls }
    }

    /// 전송 성공한 수집 횟수 확인 처리
    pub fn acknowledge_polls(&self, reported: i64) {
        if reported > 0 {
            self.pending_polls.fetch_sub(reported, Ordering::SeqCst);
        }
    }

    /// 총 수집 횟수
    pub fn poll_count(&self) -> i64 {
        self.poll_total.load(Ordering::SeqCst)
    }

    /// 미확인 수집 횟수
    pub fn pending_polls(&self) -> i64 {
        self.pending_polls.load(Ordering::SeqCst)
    }

    /// 현재 스냅샷 복사본
    pub fn snapshot(&self) -> MetricSet {
        self.snapshot.read().clone()
    }
}
