//! # mcollect-server
//!
//! MCOLLECT 서버 바이너리 진입점.

use anyhow::{anyhow, Result};
use clap::Parser;
use mcollect_core::lifecycle::LifecycleManager;
use mcollect_core::retry::RetryPolicy;
use mcollect_server::cli::Args;
use mcollect_server::ServerApp;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "mcollect_server={0},mcollect_core={0},mcollect_storage={0},mcollect_web={0},tower_http={0}",
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
        "MCOLLECT 서버 시작: 주소={}, 백업 주기={}s, 백업 파일={}, 복원={}",
        config.address, config.store_interval, config.file_storage_path, config.restore
    );

    let lifecycle = LifecycleManager::new();

    let retry = RetryPolicy::default().with_shutdown(lifecycle.subscribe());
    let app = ServerApp::build(config.clone(), retry).await;

    let listener = TcpListener::bind(&config.address)
        .await
        .map_err(|e| anyhow!("주소 바인드 실패: {}: {e}", config.address))?;

    let mut server_task = tokio::spawn(app.run(listener, lifecycle.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result.map_err(|e| anyhow!("서버 태스크 실패: {e}"))??;
            info!("MCOLLECT 서버 종료");
            return Ok(());
        }
        signal = lifecycle.wait_for_signal() => {
            if let Err(e) = signal {
                error!("시그널 대기 실패, 종료 진행: {e}");
            }
        }
    }

    lifecycle.shutdown();
    server_task
        .await
        .map_err(|e| anyhow!("서버 태스크 실패: {e}"))??;

    info!("MCOLLECT 서버 종료");
    Ok(())
}
