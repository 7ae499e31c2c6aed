//! CLI 인자 및 설정 병합.
//!
//! 플래그 > 환경변수 > 설정 파일 > 기본값.

use clap::builder::BoolishValueParser;
use clap::Parser;
use mcollect_core::config::ServerConfig;
use mcollect_core::error::CoreError;
use std::path::PathBuf;

/// MCOLLECT 메트릭 서버
///
/// 에이전트가 보낸 메트릭을 병합 저장하고 조회 API를 제공한다.
#[derive(Parser, Debug)]
#[command(name = "mcollect-server")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON 설정 파일 경로
    #[arg(short = 'c', long = "config", env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// 수신 주소 (host:port)
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// 백업 주기 (초, 0이면 종료 시에만 저장)
    #[arg(short = 'i', long, env = "STORE_INTERVAL")]
    pub store_interval: Option<u64>,

    /// 백업 파일 경로 (빈 값이면 백업 비활성)
    #[arg(short = 'f', long, env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// 부팅 시 백업 복원 여부
    #[arg(short = 'r', long, env = "RESTORE", value_parser = BoolishValueParser::new())]
    pub restore: Option<bool>,

    /// 데이터베이스 DSN (SQLite 경로)
    #[arg(short = 'd', long, env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// HMAC 공유 키
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,

    /// 종료 시 진행 중 요청 대기 한도 (초)
    #[arg(long, env = "DRAIN_TIMEOUT")]
    pub drain_timeout: Option<u64>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// 설정 파일/기본값 위에 플래그·환경변수 값을 덮어써 최종 설정 생성
    pub fn into_config(self) -> Result<ServerConfig, CoreError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load_from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(interval) = self.store_interval {
            config.store_interval = interval;
        }
        if let Some(path) = self.file_storage_path {
            config.file_storage_path = path;
        }
        if let Some(restore) = self.restore {
            config.restore = restore;
        }
        if let Some(dsn) = self.database_dsn {
            config.database_dsn = Some(dsn);
        }
        if let Some(key) = self.key {
            config.key = Some(key);
        }
        if let Some(drain) = self.drain_timeout {
            config.drain_timeout = drain;
        }

        config.validate()?;
        Ok(config)
    }
}
