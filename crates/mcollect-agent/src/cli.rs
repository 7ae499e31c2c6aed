//! CLI 인자 및 설정 병합.
//!
//! 플래그 > 환경변수 > 설정 파일 > 기본값.

use clap::Parser;
use mcollect_core::config::AgentConfig;
use mcollect_core::error::CoreError;
use std::path::PathBuf;

/// MCOLLECT 메트릭 에이전트
///
/// 런타임 통계를 주기적으로 수집해 서버로 배치 전송한다.
#[derive(Parser, Debug)]
#[command(name = "mcollect-agent")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON 설정 파일 경로
    #[arg(short = 'c', long = "config", env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// 서버 주소 (host:port)
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// 수집 주기 (초)
    #[arg(short = 'p', long, env = "POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// 전송 주기 (초)
    #[arg(short = 'r', long, env = "REPORT_INTERVAL")]
    pub report_interval: Option<u64>,

    /// HMAC 공유 키
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,

    /// 요청 타임아웃 (초)
    #[arg(long = "timeout", env = "REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// 설정 파일/기본값 위에 플래그·환경변수 값을 덮어써 최종 설정 생성
    pub fn into_config(self) -> Result<AgentConfig, CoreError> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::load_from_file(path)?,
            None => AgentConfig::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(poll) = self.poll_interval {
            config.poll_interval = poll;
        }
        if let Some(report) = self.report_interval {
            config.report_interval = report;
        }
        if let Some(key) = self.key {
            config.key = Some(key);
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }

        config.validate()?;
        Ok(config)
    }
}
