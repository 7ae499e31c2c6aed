//! # mcollect-monitor
//!
//! 에이전트측 런타임 통계 수집 어댑터.
//!
//! - [`runtime`]: sysinfo 기반 `RuntimeSampler` 구현, gauge 정적 테이블
//! - [`collector`]: 공유 스냅샷 + PollCount 관리

pub mod collector;
pub mod runtime;
