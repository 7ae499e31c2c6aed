//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 1;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    info!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let result: Result<u32, _> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );
    result.or(Ok(0))
}

/// V1: metrics 테이블 생성
///
/// id 하나당 레코드 하나. gauge는 value, counter는 delta만 채운다.
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: metrics 테이블");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metrics (
            id TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('gauge', 'counter')),
            value REAL,
            delta INTEGER,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((type = 'gauge' AND value IS NOT NULL AND delta IS NULL)
                OR (type = 'counter' AND delta IS NOT NULL AND value IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_metrics_type ON metrics(type);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn check_constraint_rejects_mixed_fields() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO metrics (id, type, value, delta) VALUES ('x', 'gauge', 1.0, 2)",
            [],
        );
        assert!(bad.is_err());

        let ok = conn.execute(
            "INSERT INTO metrics (id, type, value, delta) VALUES ('y', 'counter', NULL, 2)",
            [],
        );
        assert_eq!(ok.unwrap(), 1);
    }
}
