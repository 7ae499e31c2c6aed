//! MCOLLECT 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 에러 타입을 그대로 반환하거나 자체 에러에서 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 입력 검증, 저장소, 전송, 설정 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 알 수 없는 메트릭 타입 (gauge/counter 외)
    #[error("잘못된 메트릭 타입: {0}")]
    InvalidMetricType(String),

    /// gauge 값 누락 또는 파싱 불가
    #[error("잘못된 gauge 값: {0}")]
    InvalidGaugeValue(String),

    /// counter 값 누락 또는 파싱 불가
    #[error("잘못된 counter 값: {0}")]
    InvalidCounterValue(String),

    /// 메트릭 미발견
    #[error("메트릭 미발견: {0}")]
    MetricNotFound(String),

    /// 저장소 일시 불가 (연결 실패, I/O 에러)
    #[error("저장소 일시 불가: {0}")]
    BackendUnavailable(String),

    /// 저장소가 요청을 거부함 (제약 조건 위반, 잘못된 쿼리)
    #[error("저장소 거부: {0}")]
    BackendRejected(String),

    /// 네트워크 에러 (연결 거부, 타임아웃, DNS 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 서버가 요청을 거부함 (2xx 외 응답)
    #[error("서버 거부 ({status}): {body}")]
    Rejected {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문
        body: String,
    },

    /// 재시도 한도 소진
    #[error("{attempts}회 시도 후 실패: {last}")]
    RetriesExhausted {
        /// 총 시도 횟수
        attempts: u32,
        /// 마지막 에러
        last: Box<CoreError>,
    },

    /// 종료 신호로 작업 취소됨
    #[error("작업 취소됨 (종료 중)")]
    Cancelled,

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 파일 I/O 실패
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 재시도 대상 여부 (일시적 인프라 장애만 해당)
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::BackendUnavailable(_))
    }

    /// 사용자 입력 검증 에러 여부
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidMetricType(_)
                | CoreError::InvalidGaugeValue(_)
                | CoreError::InvalidCounterValue(_)
        )
    }
}
