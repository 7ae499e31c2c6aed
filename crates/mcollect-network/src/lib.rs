//! # mcollect-network
//!
//! 에이전트측 네트워크 어댑터.
//!
//! - [`compression`]: gzip `Compressor` 구현 (flate2)
//! - [`reporter`]: 재시도 HTTP 배치 전송 `MetricsReporter` 구현 (reqwest)

pub mod compression;
pub mod reporter;

pub use compression::GzipCompressor;
pub use reporter::HttpReporter;
