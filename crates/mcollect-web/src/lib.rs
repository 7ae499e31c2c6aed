//! # mcollect-web
//!
//! 메트릭 수집 HTTP 서버.
//! Axum 기반 갱신/조회 엔드포인트, gzip 요청/응답 압축, HMAC 서명 검증.
//!
//! ## 엔드포인트
//! - `POST /update/{type}/{name}/{value}`: 경로 기반 단건 갱신
//! - `POST /update/`: JSON 단건 갱신
//! - `POST /updates/`: JSON 배치 갱신
//! - `GET /value/{type}/{name}`: 일반 텍스트 값 조회
//! - `POST /value/`: JSON 조회
//! - `GET /ping`: 저장소 생존 확인 (영속 백엔드일 때만)
//! - `GET /`: HTML 목록

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use mcollect_core::lifecycle::shutdown_requested;
use mcollect_core::ports::store::MetricsStore;
use mcollect_core::signing::PayloadSigner;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// 기본 drain 한도
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 메트릭 저장소
    pub store: Arc<dyn MetricsStore>,
    /// 서명기 (키 미설정 시 None)
    pub signer: Option<PayloadSigner>,
}

/// 메트릭 수집 서버
pub struct MetricsServer {
    state: AppState,
    drain_timeout: Duration,
}

impl MetricsServer {
    /// 새 서버 생성
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self {
            state: AppState {
                store,
                signer: None,
            },
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// 서명기 설정
    pub fn with_signer(mut self, signer: Option<PayloadSigner>) -> Self {
        self.state.signer = signer;
        self
    }

    /// 종료 시 진행 중 요청 대기 한도 설정
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// 라우터 생성
    pub fn router(&self) -> Router {
        routes::build_router(self.state.clone())
    }

    /// 이미 바인드된 리스너로 서버 실행
    ///
    /// 종료 신호 후 새 연결 수락을 멈추고, 진행 중 요청은 drain 한도까지 기다린다.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(
            "메트릭 서버 시작: http://{addr} (저장소: {}, 서명: {})",
            self.state.store.backend_name(),
            if self.state.signer.is_some() { "사용" } else { "미사용" }
        );

        let app = self.router();
        let mut graceful_rx = shutdown_rx.clone();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_requested(&mut graceful_rx).await;
                info!("웹 서버 종료 신호 수신");
            })
            .into_future();
        tokio::pin!(server);

        let mut drain_rx = shutdown_rx;
        tokio::select! {
            result = &mut server => return result,
            _ = shutdown_requested(&mut drain_rx) => {}
        }

        match tokio::time::timeout(self.drain_timeout, server).await {
            Ok(result) => {
                info!("메트릭 서버 종료");
                result
            }
            Err(_) => {
                warn!(
                    "drain 한도 {:?} 초과, 남은 연결을 닫고 종료",
                    self.drain_timeout
                );
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use mcollect_storage::MemStorage;

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = watch::channel(false);

        let server = MetricsServer::new(Arc::new(MemStorage::new()))
            .with_drain_timeout(Duration::from_millis(500));
        let handle = tokio::spawn(server.serve(listener, rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("서버가 제때 종료되어야 함")
            .unwrap();
        assert!(result.is_ok());
    }
}
