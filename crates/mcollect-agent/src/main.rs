//! # mcollect-agent
//!
//! MCOLLECT 에이전트 바이너리 진입점.
//! 어댑터 와이어링, 라이프사이클 관리, 스케줄러 오케스트레이션.

mod cli;
mod scheduler;

use anyhow::{anyhow, Result};
use clap::Parser;
use mcollect_core::lifecycle::LifecycleManager;
use mcollect_core::retry::RetryPolicy;
use mcollect_core::signing::PayloadSigner;
use mcollect_monitor::collector::MetricsCollector;
use mcollect_monitor::runtime::SysInfoSampler;
use mcollect_network::HttpReporter;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::scheduler::{Scheduler, SchedulerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "mcollect_agent={0},mcollect_core={0},mcollect_monitor={0},mcollect_network={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = args
        .into_config()
        .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;

    info!(
        "MCOLLECT 에이전트 시작: 서버={}, 수집={}s, 전송={}s, 서명={}",
        config.server_url(),
        config.poll_interval,
        config.report_interval,
        if config.key.is_some() { "사용" } else { "미사용" }
    );

    let lifecycle = LifecycleManager::new();

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 런타임 통계 샘플러 + 수집기
    let sampler = Arc::new(SysInfoSampler::new());
    let collector = Arc::new(MetricsCollector::new(sampler));

    // 2. HTTP 전송기 (gzip + 서명 + 취소 가능한 재시도)
    let reporter = HttpReporter::new(&config.server_url(), config.request_timeout())?
        .with_signer(PayloadSigner::from_key(config.key.as_deref()))
        .with_retry(RetryPolicy::default().with_shutdown(lifecycle.subscribe()));
    info!("전송 엔드포인트: {}", reporter.endpoint());

    // 3. 스케줄러
    let scheduler = Scheduler::new(
        SchedulerConfig {
            poll_interval: config.poll_interval(),
            report_interval: config.report_interval(),
        },
        collector,
        Arc::new(reporter),
    );

    let shutdown_rx = lifecycle.subscribe();
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    if let Err(e) = lifecycle.wait_for_signal().await {
        error!("시그널 대기 실패, 종료 진행: {e}");
    }
    lifecycle.shutdown();

    scheduler_task
        .await
        .map_err(|e| anyhow!("스케줄러 태스크 실패: {e}"))?;

    info!("MCOLLECT 에이전트 종료");
    Ok(())
}
