//! # mcollect-storage
//!
//! 서버측 저장소 어댑터.
//! `MetricsStore` 포트를 인메모리 맵과 SQLite 테이블로 구현하고,
//! 인메모리 백엔드를 위한 JSON 파일 백업/복원을 제공한다.
//!
//! ## 모듈
//! - `memory`: 인메모리 저장소 (RwLock 맵)
//! - `sqlite`: SQLite 저장소 (트랜잭션 배치, 연결 재시도)
//! - `backup`: 스냅샷 파일 저장/복원
//! - `migration`: 스키마 마이그레이션

pub mod backup;
pub mod memory;
pub mod migration;
pub mod sqlite;

pub use backup::BackupManager;
pub use memory::MemStorage;
pub use sqlite::SqliteStore;
