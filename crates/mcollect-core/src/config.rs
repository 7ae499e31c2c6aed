//! 애플리케이션 설정 구조체.
//!
//! 에이전트/서버 런타임 설정을 정의한다.
//! 우선순위: CLI 플래그 > 환경변수 > JSON 설정 파일 > 기본값.
//! 플래그/환경변수 병합은 바이너리(clap)에서, 파일/기본값은 여기서 처리한다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::CoreError;

/// 기본 서버 주소
pub const DEFAULT_ADDRESS: &str = "localhost:8080";

// ============================================================
// 에이전트 설정
// ============================================================

/// 에이전트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 서버 주소 (`host:port` 또는 URL)
    pub address: String,
    /// 수집 주기 (초)
    pub poll_interval: u64,
    /// 전송 주기 (초)
    pub report_interval: u64,
    /// HMAC 공유 키
    pub key: Option<String>,
    /// 요청 타임아웃 (초)
    pub request_timeout: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            poll_interval: 2,
            report_interval: 10,
            key: None,
            request_timeout: 5,
        }
    }
}

impl AgentConfig {
    /// JSON 설정 파일 로드
    pub fn load_from_file(path: &Path) -> Result<Self, CoreError> {
        load_json(path)
    }

    /// 수집 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// 전송 주기
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// 스킴이 붙은 서버 기본 URL
    pub fn server_url(&self) -> String {
        let address = self.address.trim().trim_end_matches('/');
        if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        }
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.address.trim().is_empty() {
            return Err(CoreError::Config("서버 주소가 비어 있음".to_string()));
        }
        if self.poll_interval == 0 {
            return Err(CoreError::Config("poll_interval은 1초 이상이어야 함".to_string()));
        }
        if self.report_interval == 0 {
            return Err(CoreError::Config(
                "report_interval은 1초 이상이어야 함".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(CoreError::Config(
                "request_timeout은 1초 이상이어야 함".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// 서버 설정
// ============================================================

/// 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 수신 주소 (`host:port`)
    pub address: String,
    /// 백업 주기 (초, 0이면 종료 시에만 저장)
    pub store_interval: u64,
    /// 백업 파일 경로 (비어 있으면 백업 비활성)
    pub file_storage_path: String,
    /// 시작 시 백업 복원 여부
    pub restore: bool,
    /// 데이터베이스 DSN (없으면 인메모리 저장소)
    pub database_dsn: Option<String>,
    /// HMAC 공유 키
    pub key: Option<String>,
    /// 종료 시 요청 처리 대기 한도 (초)
    pub drain_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            store_interval: 300,
            file_storage_path: "/tmp/metrics-db.json".to_string(),
            restore: true,
            database_dsn: None,
            key: None,
            drain_timeout: 5,
        }
    }
}

impl ServerConfig {
    /// JSON 설정 파일 로드
    pub fn load_from_file(path: &Path) -> Result<Self, CoreError> {
        load_json(path)
    }

    /// 백업 주기 (0이면 None)
    pub fn store_interval(&self) -> Option<Duration> {
        (self.store_interval > 0).then(|| Duration::from_secs(self.store_interval))
    }

    /// 백업 파일 경로 (비어 있으면 None)
    pub fn backup_path(&self) -> Option<PathBuf> {
        let path = self.file_storage_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// 데이터베이스 DSN (비어 있으면 None)
    pub fn database_dsn(&self) -> Option<&str> {
        self.database_dsn
            .as_deref()
            .map(str::trim)
            .filter(|dsn| !dsn.is_empty())
    }

    /// 종료 대기 한도
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.address.trim().is_empty() {
            return Err(CoreError::Config("수신 주소가 비어 있음".to_string()));
        }
        Ok(())
    }
}

/// JSON 파일에서 설정 로드 (누락 필드는 기본값)
fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
    })?;

    let config = serde_json::from_str(&content).map_err(|e| {
        CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
    })?;

    debug!("설정 파일 로드 완료: {}", path.display());
    Ok(config)
}
