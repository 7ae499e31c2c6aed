//! 재시도 정책.
//!
//! 일시적 장애(`CoreError::is_transient`)만 고정 지연(1s, 3s, 5s)으로 재시도한다.
//! 지연 대기는 종료 신호로 즉시 중단된다.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

use crate::error::CoreError;
use crate::lifecycle::shutdown_requested;

/// 기본 재시도 지연 (시도 횟수 = 지연 개수)
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(3),
    Duration::from_secs(5),
];

/// 고정 지연 재시도 정책
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl RetryPolicy {
    /// 지정 지연 목록으로 정책 생성
    ///
    /// n번째 일시적 실패 뒤 `delays[n-1]`만큼 대기한다. 마지막 지연 뒤에는 포기한다.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self {
            delays,
            shutdown: None,
        }
    }

    /// 재시도 없이 한 번만 시도
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// 종료 신호 연결 (대기 중 취소 가능)
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// 최대 시도 횟수
    pub fn max_attempts(&self) -> u32 {
        self.delays.len().max(1) as u32
    }

    /// 작업 실행 (재시도 포함)
    ///
    /// - 성공 → 즉시 반환
    /// - 일시적이지 않은 에러 → 재시도 없이 반환
    /// - 시도 소진 → `RetriesExhausted`
    /// - 대기 중 종료 신호 → `Cancelled`
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.max_attempts();
        let mut shutdown = self.shutdown.clone();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            let delay = self
                .delays
                .get((attempt - 1) as usize)
                .copied()
                .unwrap_or_default();
            warn!("{label} 실패 (시도 {attempt}/{max_attempts}): {err}, {delay:?} 대기");

            pause(delay, shutdown.as_mut()).await?;

            if attempt >= max_attempts {
                return Err(CoreError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAYS.to_vec())
    }
}

/// 취소 가능한 대기
async fn pause(
    delay: Duration,
    shutdown: Option<&mut watch::Receiver<bool>>,
) -> Result<(), CoreError> {
    let Some(rx) = shutdown else {
        tokio::time::sleep(delay).await;
        return Ok(());
    };

    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = shutdown_requested(rx) => Err(CoreError::Cancelled),
    }
}
