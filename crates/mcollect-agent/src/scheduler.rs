//! 2-루프 스케줄러.
//!
//! 수집(poll_interval)과 전송(report_interval)을 독립 주기로 돌린다.
//! 수집은 스냅샷만 갱신하고, 전송은 그 시점의 스냅샷을 배치로 보낸다.

use mcollect_core::error::CoreError;
use mcollect_core::lifecycle::shutdown_requested;
use mcollect_core::ports::reporter::MetricsReporter;
use mcollect_monitor::collector::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 수집 주기
    pub poll_interval: Duration,
    /// 전송 주기
    pub report_interval: Duration,
}

/// 에이전트 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    collector: Arc<MetricsCollector>,
    reporter: Arc<dyn MetricsReporter>,
}

impl Scheduler {
    /// 새 스케줄러 생성
    pub fn new(
        config: SchedulerConfig,
        collector: Arc<MetricsCollector>,
        reporter: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            config,
            collector,
            reporter,
        }
    }

    /// 두 루프 실행 (종료 신호까지)
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        info!(
            "스케줄러 시작: 수집={}ms, 전송={}ms",
            self.config.poll_interval.as_millis(),
            self.config.report_interval.as_millis(),
        );

        // ============================================================
        // 1. 수집 루프
        // ============================================================
        let collector1 = self.collector.clone();
        let poll = self.config.poll_interval;
        let mut shutdown1 = shutdown_rx.clone();

        let poll_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = collector1.collect().await {
                            warn!("메트릭 수집 실패: {e}");
                        }
                    }
                    _ = shutdown_requested(&mut shutdown1) => {
                        info!("수집 루프 종료");
                        break;
                    }
                }
            }
        });

        // ============================================================
        // 2. 전송 루프 (첫 전송은 한 주기 뒤)
        // ============================================================
        let collector2 = self.collector.clone();
        let reporter2 = self.reporter.clone();
        let report = self.config.report_interval;
        let mut shutdown2 = shutdown_rx.clone();

        let report_task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + report, report);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        report_once(&collector2, reporter2.as_ref()).await;
                    }
                    _ = shutdown_requested(&mut shutdown2) => {
                        info!("전송 루프 종료");
                        break;
                    }
                }
            }
        });

        let (poll_result, report_result) = tokio::join!(poll_task, report_task);
        if let Err(e) = poll_result {
            warn!("수집 태스크 비정상 종료: {e}");
        }
        if let Err(e) = report_result {
            warn!("전송 태스크 비정상 종료: {e}");
        }
        info!("스케줄러 종료");
    }
}

/// 현재 스냅샷 1회 전송
///
/// 성공한 경우에만 PollCount 증분을 확인 처리한다. 실패는 로그만 남기고
/// 다음 주기에 누적된 증분과 함께 다시 보낸다.
pub async fn report_once(collector: &MetricsCollector, reporter: &dyn MetricsReporter) {
    let batch = collector.batch();
    if batch.is_empty() {
        debug!("전송할 메트릭 없음");
        return;
    }

    match reporter.report(&batch.records).await {
        Ok(()) => {
            collector.acknowledge_polls(batch.polls);
            debug!("전송 완료: {}개 (PollCount +{})", batch.records.len(), batch.polls);
        }
        Err(CoreError::Cancelled) => info!("종료 중 전송 취소"),
        Err(e) => warn!("메트릭 전송 실패: {e}"),
    }
}
