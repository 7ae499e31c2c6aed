//! 라이프사이클 관리.
//!
//! 종료 신호 전파, 시그널 핸들링.

use tokio::sync::watch;
use tracing::info;

use crate::error::CoreError;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM) 후 종료 신호 발송
    pub async fn wait_for_signal(&self) -> Result<(), CoreError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("Ctrl+C 수신");
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 종료 신호가 올 때까지 대기
///
/// 송신측이 사라지면 영원히 대기한다 (종료 신호가 더 이상 올 수 없음).
pub async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lifecycle_creation() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!*rx.borrow());
    }

    #[test]
    fn shutdown_signal() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        lm.shutdown();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn shutdown_requested_wakes_on_signal() {
        let lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        let waiter = tokio::spawn(async move { shutdown_requested(&mut rx).await });
        lm.shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("종료 대기가 깨어나야 함")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_requested_returns_immediately_when_already_set() {
        let lm = LifecycleManager::new();
        lm.shutdown();
        let mut rx = lm.subscribe();
        tokio::time::timeout(Duration::from_millis(100), shutdown_requested(&mut rx))
            .await
            .expect("이미 종료 상태면 즉시 반환");
    }
}
