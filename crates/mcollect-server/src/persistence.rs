//! 백업 스케줄링.
//!
//! 부팅 시 복원, 주기적 저장, 종료 시 최종 저장. 실패는 모두 로그만 남긴다.

use mcollect_core::lifecycle::shutdown_requested;
use mcollect_core::ports::store::MetricsStore;
use mcollect_storage::BackupManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// 스냅샷 저장 (실패해도 계속 진행)
pub async fn save_best_effort(backup: &BackupManager, store: &dyn MetricsStore) -> bool {
    match backup.save_snapshot(store).await {
        Ok(count) => {
            info!("백업 저장 완료: {count}개 → {}", backup.path().display());
            true
        }
        Err(e) => {
            warn!("백업 저장 실패: {}: {e}", backup.path().display());
            false
        }
    }
}

/// 스냅샷 복원 (실패해도 빈 상태로 계속 진행)
pub async fn restore_best_effort(backup: &BackupManager, store: &dyn MetricsStore) -> usize {
    match backup.load_snapshot(store).await {
        Ok(count) => count,
        Err(e) => {
            warn!("백업 복원 실패, 빈 상태로 시작: {}: {e}", backup.path().display());
            0
        }
    }
}

/// 주기적 백업 루프 (종료 신호까지)
pub async fn run_backup_loop(
    backup: BackupManager,
    store: Arc<dyn MetricsStore>,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("백업 루프 시작: {}초 주기", every.as_secs());
    let mut interval = interval_at(Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                save_best_effort(&backup, store.as_ref()).await;
            }
            _ = shutdown_requested(&mut shutdown_rx) => {
                info!("백업 루프 종료");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcollect_core::models::MetricRecord;
    use mcollect_storage::MemStorage;

    #[tokio::test]
    async fn loop_saves_after_first_period() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupManager::new(dir.path().join("db.json"));
        let store = Arc::new(MemStorage::new());
        store
            .update_metric(&MetricRecord::counter("c", 1))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_backup_loop(
            backup.clone(),
            store.clone(),
            Duration::from_millis(300),
            rx,
        ));

        assert!(backup.read_set().await.unwrap().is_none(), "첫 저장은 한 주기 뒤");

        let mut saved = None;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if let Some(set) = backup.read_set().await.unwrap() {
                saved = Some(set);
                break;
            }
        }
        assert_eq!(saved.expect("주기 저장 필요")["c"].delta, Some(1));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn failures_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let backup = BackupManager::new(blocker.join("db.json"));
        let store = MemStorage::new();

        assert!(!save_best_effort(&backup, &store).await);

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "[1,2").unwrap();
        assert_eq!(
            restore_best_effort(&BackupManager::new(&corrupt), &store).await,
            0
        );
        assert!(store.is_empty());
    }
}
