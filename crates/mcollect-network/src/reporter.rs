//! HTTP 메트릭 전송기.
//!
//! `MetricsReporter` 포트 구현.
//! JSON 직렬화 → gzip 압축 → (선택) HMAC 서명 → `POST {base}/updates/`.
//! 연결 실패/타임아웃만 재시도하고, 서버 거부는 즉시 반환한다.

use async_trait::async_trait;
use mcollect_core::error::CoreError;
use mcollect_core::models::MetricRecord;
use mcollect_core::ports::compressor::Compressor;
use mcollect_core::ports::reporter::MetricsReporter;
use mcollect_core::retry::RetryPolicy;
use mcollect_core::signing::{PayloadSigner, HASH_HEADER};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::compression::GzipCompressor;

/// 배치 업데이트 경로
pub const UPDATES_PATH: &str = "updates/";

/// reqwest 에러 분류
///
/// 연결 실패, 타임아웃, 요청 전송 중 끊김은 일시적 장애로 본다.
fn classify(e: reqwest::Error) -> CoreError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        CoreError::Network(e.to_string())
    } else {
        CoreError::Internal(format!("HTTP 요청 실패: {e}"))
    }
}

/// HTTP 전송기: `MetricsReporter` 포트 구현
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: Url,
    compressor: Arc<dyn Compressor>,
    signer: Option<PayloadSigner>,
    retry: RetryPolicy,
}

impl HttpReporter {
    /// 새 전송기 생성
    ///
    /// `base_url`은 `http://` 또는 `https://` 스킴을 포함해야 한다.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let endpoint = updates_endpoint(base_url)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            compressor: Arc::new(GzipCompressor::new()),
            signer: None,
            retry: RetryPolicy::default(),
        })
    }

    /// 서명기 설정 (None이면 서명 헤더 생략)
    pub fn with_signer(mut self, signer: Option<PayloadSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// 재시도 정책 설정
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 전송 대상 URL
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// 본문 인코딩: (압축 본문, 서명)
    ///
    /// 서명은 압축 전 JSON 바이트 기준.
    fn encode(&self, batch: &[MetricRecord]) -> Result<(Vec<u8>, Option<String>), CoreError> {
        let json = serde_json::to_vec(batch)?;
        let signature = match &self.signer {
            Some(signer) => Some(signer.sign(&json)?),
            None => None,
        };
        let compressed = self.compressor.compress(&json)?;
        debug!(
            "배치 인코딩: {}개 레코드, {} → {} bytes",
            batch.len(),
            json.len(),
            compressed.len()
        );
        Ok((compressed, signature))
    }

    /// 1회 전송
    async fn send_once(&self, body: &[u8], signature: Option<&str>) -> Result<(), CoreError> {
        let mut req = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, self.compressor.encoding())
            .body(body.to_vec());

        if let Some(sig) = signature {
            req = req.header(HASH_HEADER, sig);
        }

        let resp = req.send().await.map_err(classify)?;
        check_response(resp).await
    }
}

/// 응답 상태 확인 (2xx 외는 모두 거부로 처리)
async fn check_response(resp: reqwest::Response) -> Result<(), CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let body = resp.text().await.unwrap_or_else(|e| {
        warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });

    Err(CoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// 기본 URL에 배치 경로를 붙인다 (기존 경로 접두사 유지)
fn updates_endpoint(base_url: &str) -> Result<Url, CoreError> {
    let mut base = Url::parse(base_url)
        .map_err(|e| CoreError::Config(format!("잘못된 서버 URL {base_url}: {e}")))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(CoreError::Config(format!(
            "지원하지 않는 스킴: {}",
            base.scheme()
        )));
    }

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(UPDATES_PATH)
        .map_err(|e| CoreError::Config(format!("엔드포인트 구성 실패: {e}")))
}

#[async_trait]
impl MetricsReporter for HttpReporter {
    async fn report(&self, batch: &[MetricRecord]) -> Result<(), CoreError> {
        if batch.is_empty() {
            debug!("전송할 메트릭 없음, 건너뜀");
            return Ok(());
        }

        let (body, signature) = self.encode(batch)?;
        self.retry
            .run("메트릭 배치 전송", || {
                self.send_once(&body, signature.as_deref())
            })
            .await?;

        debug!("메트릭 배치 전송 성공: {}개 → {}", batch.len(), self.endpoint);
        Ok(())
    }
}
