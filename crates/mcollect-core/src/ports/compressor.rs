//! 압축 포트 (전송 본문 압축).
//!
//! 구현: `mcollect-network` crate (flate2)

use crate::error::CoreError;

/// 데이터 압축 인터페이스
pub trait Compressor: Send + Sync {
    /// `Content-Encoding` 헤더 값 (예: "gzip")
    fn encoding(&self) -> &'static str;

    /// 데이터 압축
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError>;
}
