//! # mcollect-server
//!
//! MCOLLECT 서버 조립.
//! 저장소 백엔드 선택(실패 시 인메모리 대체), 부팅 시 복원,
//! 주기적 백업, HTTP 서버 실행, 종료 시 최종 저장 순서를 관리한다.

pub mod cli;
pub mod persistence;

use mcollect_core::config::ServerConfig;
use mcollect_core::ports::store::MetricsStore;
use mcollect_core::retry::RetryPolicy;
use mcollect_core::signing::PayloadSigner;
use mcollect_storage::{BackupManager, MemStorage, SqliteStore};
use mcollect_web::MetricsServer;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 설정에 따라 저장소 백엔드 생성
///
/// DSN이 있으면 SQLite, 초기화에 실패하면 인메모리로 대체한다.
pub async fn open_store(config: &ServerConfig, retry: RetryPolicy) -> Arc<dyn MetricsStore> {
    let Some(dsn) = config.database_dsn() else {
        info!("DSN 미설정, 인메모리 저장소 사용");
        return Arc::new(MemStorage::new());
    };

    match SqliteStore::connect(dsn, retry).await {
        Ok(store) => {
            info!("SQLite 저장소 사용: {dsn}");
            Arc::new(store)
        }
        Err(e) => {
            error!("DB 초기화 실패, 인메모리 저장소로 대체: {e}");
            Arc::new(MemStorage::new())
        }
    }
}

/// 서버 애플리케이션
pub struct ServerApp {
    config: ServerConfig,
    store: Arc<dyn MetricsStore>,
    backup: Option<BackupManager>,
}

impl ServerApp {
    /// 저장소를 열고, 설정되어 있으면 백업에서 복원
    pub async fn build(config: ServerConfig, retry: RetryPolicy) -> Self {
        let store = open_store(&config, retry).await;
        Self::with_store(config, store).await
    }

    /// 주어진 저장소로 조립
    ///
    /// 파일 백업은 자체 영속성이 없는 백엔드에만 적용한다.
    pub async fn with_store(config: ServerConfig, store: Arc<dyn MetricsStore>) -> Self {
        let backup = if store.is_durable() {
            None
        } else {
            config.backup_path().map(BackupManager::new)
        };

        match &backup {
            Some(backup) if config.restore => {
                let count = persistence::restore_best_effort(backup, store.as_ref()).await;
                info!("부팅 시 복원: {count}개");
            }
            Some(backup) => info!("복원 생략 (restore=false): {}", backup.path().display()),
            None if !store.is_durable() => warn!("백업 경로 미설정, 재시작 시 메트릭이 유실됨"),
            None => {}
        }

        Self {
            config,
            store,
            backup,
        }
    }

    /// 저장소 핸들
    pub fn store(&self) -> Arc<dyn MetricsStore> {
        self.store.clone()
    }

    /// 서버 실행 (종료 신호까지)
    ///
    /// 종료 순서: 백업 루프 정지 → HTTP drain → 최종 백업 저장.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let backup_task = match (&self.backup, self.config.store_interval()) {
            (Some(backup), Some(every)) => Some(tokio::spawn(persistence::run_backup_loop(
                backup.clone(),
                self.store.clone(),
                every,
                shutdown_rx.clone(),
            ))),
            _ => None,
        };

        let server = MetricsServer::new(self.store.clone())
            .with_signer(PayloadSigner::from_key(self.config.key.as_deref()))
            .with_drain_timeout(self.config.drain_timeout());
        let result = server.serve(listener, shutdown_rx).await;

        // 정상 종료라면 백업 루프도 같은 신호로 멈춘다
        if let Some(task) = backup_task {
            if result.is_err() {
                task.abort();
            }
            let _ = task.await;
        }

        if let Some(backup) = &self.backup {
            persistence::save_best_effort(backup, self.store.as_ref()).await;
        }

        result
    }
}
