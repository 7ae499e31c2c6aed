//! SQLite 저장소 어댑터.
//!
//! `MetricsStore` 포트 구현 (관계형 백엔드).
//! 배치는 단일 트랜잭션으로 처리하고, 연결 수준 장애만 재시도한다.
//!
//! # 모듈 구조
//! - `metrics`: MetricsStore 포트 구현, 행 변환

mod metrics;

use mcollect_core::error::CoreError;
use mcollect_core::retry::RetryPolicy;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

use crate::migration;

/// 인메모리 DSN
pub const MEMORY_DSN: &str = ":memory:";

/// 잠금 대기 한도
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// rusqlite 에러 분류
///
/// 연결/잠금/I/O 장애 → `BackendUnavailable` (재시도 대상),
/// 제약 조건 위반, 잘못된 쿼리 등 → `BackendRejected`.
pub(crate) fn classify(e: rusqlite::Error) -> CoreError {
    match e.sqlite_error_code() {
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase,
        ) => CoreError::BackendUnavailable(e.to_string()),
        _ => CoreError::BackendRejected(e.to_string()),
    }
}

/// SQLite 저장소: `MetricsStore` 포트 구현
pub struct SqliteStore {
    pub(super) conn: Mutex<Connection>,
    pub(super) retry: RetryPolicy,
}

impl SqliteStore {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::BackendUnavailable(format!(
                    "DB 디렉토리 생성 실패: {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(classify)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(classify)?;

        let store = Self::init(conn)?;
        info!("SQLite 저장소 초기화: {}", path.display());
        Ok(store)
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(classify)?;
        Self::init(conn)
    }

    /// DSN으로 저장소 생성
    ///
    /// - `:memory:` → 인메모리
    /// - `sqlite://path`, `sqlite:path`, `path` → 파일
    pub fn from_dsn(dsn: &str) -> Result<Self, CoreError> {
        let dsn = dsn.trim();
        let path = dsn
            .strip_prefix("sqlite://")
            .or_else(|| dsn.strip_prefix("sqlite:"))
            .unwrap_or(dsn);

        if path.is_empty() {
            return Err(CoreError::Config("빈 DATABASE_DSN".to_string()));
        }
        if path == MEMORY_DSN {
            return Self::open_in_memory();
        }
        Self::open(Path::new(path))
    }

    /// DSN으로 저장소 생성 (연결 실패 시 재시도)
    pub async fn connect(dsn: &str, retry: RetryPolicy) -> Result<Self, CoreError> {
        let store = retry.run("SQLite 연결", || async { Self::from_dsn(dsn) }).await?;
        Ok(store.with_retry(retry))
    }

    /// 재시도 정책 설정
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(classify)?;
        migration::run_migrations(&conn).map_err(|e| {
            warn!("마이그레이션 실패: {e}");
            classify(e)
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            retry: RetryPolicy::default(),
        })
    }

    /// 연결 잠금 후 작업 실행
    pub(super) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_busy_as_unavailable() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(classify(busy).is_transient());

        let constraint = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("CHECK constraint failed".to_string()),
        );
        assert!(matches!(
            classify(constraint),
            CoreError::BackendRejected(_)
        ));
    }

    #[test]
    fn dsn_variants() {
        assert!(SqliteStore::from_dsn(":memory:").is_ok());
        assert!(SqliteStore::from_dsn("sqlite://:memory:").is_ok());
        assert!(matches!(
            SqliteStore::from_dsn("  "),
            Err(CoreError::Config(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics.db");
        let dsn = format!("sqlite://{}", path.display());
        SqliteStore::from_dsn(&dsn).unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn connect_fails_fast_on_config_error() {
        let result = SqliteStore::connect("", RetryPolicy::default()).await;
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn connect_retries_unopenable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        // 부모 경로가 일반 파일이라 디렉토리 생성 불가
        let dsn = blocker.join("metrics.db").display().to_string();
        let retry = RetryPolicy::new(vec![Duration::from_millis(10); 2]);

        let result = SqliteStore::connect(&dsn, retry).await;
        assert!(matches!(
            result,
            Err(CoreError::RetriesExhausted { attempts: 2, .. })
        ));
    }
}
