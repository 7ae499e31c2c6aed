//! # mcollect-core
//!
//! MCOLLECT 도메인 모델, 병합 엔진, 포트(trait) 정의, 에러 타입.
//! 에이전트와 서버가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 메트릭 레코드 (serde Serialize/Deserialize)
//! - [`merge`]: gauge 교체 / counter 누적 병합 엔진
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`retry`]: 취소 가능한 고정 지연 재시도 정책
//! - [`signing`]: HMAC-SHA256 페이로드 서명
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 에이전트/서버 설정 구조체
//! - [`lifecycle`]: 종료 신호 관리

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod models;
pub mod ports;
pub mod retry;
pub mod signing;
