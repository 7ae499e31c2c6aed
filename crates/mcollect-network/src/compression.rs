//! gzip 압축 어댑터.
//!
//! `Compressor` 포트 구현. 전송 본문을 `Content-Encoding: gzip`으로 압축한다.

use flate2::read::GzEncoder;
use flate2::Compression;
use mcollect_core::error::CoreError;
use mcollect_core::ports::compressor::Compressor;
use std::io::Read;

/// gzip 압축기: `Compressor` 포트 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipCompressor;

impl GzipCompressor {
    /// 기본 압축 수준으로 생성
    pub fn new() -> Self {
        Self
    }
}

impl Compressor for GzipCompressor {
    fn encoding(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        let mut encoder = GzEncoder::new(data, Compression::default());
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| CoreError::Internal(format!("gzip 압축 실패: {e}")))?;
        Ok(compressed)
    }
}
