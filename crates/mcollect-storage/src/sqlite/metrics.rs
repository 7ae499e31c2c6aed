//! 메트릭 스토리지 (MetricsStore 포트 구현).
//!
//! 읽기-병합-쓰기를 트랜잭션 안에서 수행해 두 백엔드의 병합 의미를 맞춘다.

use async_trait::async_trait;
use mcollect_core::error::CoreError;
use mcollect_core::merge::merge;
use mcollect_core::models::{MetricKind, MetricRecord, MetricSet};
use mcollect_core::ports::store::MetricsStore;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use tracing::debug;

use super::{classify, SqliteStore};

/// 행 → 레코드 변환
fn row_to_record(row: &Row<'_>) -> Result<MetricRecord, rusqlite::Error> {
    let kind: String = row.get(1)?;
    Ok(MetricRecord {
        id: row.get(0)?,
        kind: MetricKind::from(kind),
        value: row.get(2)?,
        delta: row.get(3)?,
    })
}

/// id로 단건 조회
fn load(conn: &Connection, id: &str) -> Result<Option<MetricRecord>, CoreError> {
    conn.query_row(
        "SELECT id, type, value, delta FROM metrics WHERE id = ?1",
        [id],
        row_to_record,
    )
    .optional()
    .map_err(classify)
}

/// 레코드 upsert (id 기준 덮어쓰기)
fn upsert(conn: &Connection, record: &MetricRecord) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO metrics (id, type, value, delta, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
             type = excluded.type,
             value = excluded.value,
             delta = excluded.delta,
             updated_at = excluded.updated_at",
        rusqlite::params![record.id, record.kind.as_str(), record.value, record.delta],
    )
    .map_err(classify)?;
    Ok(())
}

/// 단건 병합 후 저장
fn merge_one(conn: &Connection, incoming: &MetricRecord) -> Result<MetricRecord, CoreError> {
    let current = load(conn, &incoming.id)?;
    let merged = merge(current.as_ref(), incoming)?;
    upsert(conn, &merged)?;
    Ok(merged)
}

impl SqliteStore {
    fn update_metric_blocking(&self, record: &MetricRecord) -> Result<MetricRecord, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(classify)?;
            let merged = merge_one(&tx, record)?;
            tx.commit().map_err(classify)?;
            Ok(merged)
        })
    }

    /// 배치 전체를 한 트랜잭션으로 처리 (하나라도 실패하면 전체 롤백)
    fn update_batch_blocking(&self, records: &[MetricRecord]) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(classify)?;
            for record in records {
                merge_one(&tx, record)?;
            }
            tx.commit().map_err(classify)
        })
    }

    fn restore_blocking(&self, set: &MetricSet) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(classify)?;
            for record in set.values() {
                record.validate()?;
                upsert(&tx, record)?;
            }
            tx.commit().map_err(classify)
        })
    }

    fn snapshot_blocking(&self) -> Result<MetricSet, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, type, value, delta FROM metrics ORDER BY id")
                .map_err(classify)?;
            let rows = stmt.query_map([], row_to_record).map_err(classify)?;

            let mut set = MetricSet::new();
            for row in rows {
                let record = row.map_err(classify)?;
                set.insert(record.id.clone(), record);
            }
            Ok(set)
        })
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    async fn update_metric(&self, record: &MetricRecord) -> Result<MetricRecord, CoreError> {
        record.validate()?;
        let merged = self
            .retry
            .run("메트릭 저장", || async { self.update_metric_blocking(record) })
            .await?;
        debug!("메트릭 저장: {} ({})", merged.id, merged.kind);
        Ok(merged)
    }

    async fn update_batch(&self, records: &[MetricRecord]) -> Result<(), CoreError> {
        self.retry
            .run("배치 저장", || async { self.update_batch_blocking(records) })
            .await?;
        debug!("배치 저장: {}개", records.len());
        Ok(())
    }

    async fn get_metric(&self, id: &str) -> Result<MetricRecord, CoreError> {
        self.retry
            .run("메트릭 조회", || async {
                self.with_conn(|conn| load(conn, id))
            })
            .await?
            .ok_or_else(|| CoreError::MetricNotFound(id.to_string()))
    }

    async fn get_all_gauges(&self) -> Result<BTreeMap<String, f64>, CoreError> {
        self.retry
            .run("gauge 목록 조회", || async {
                self.with_conn(|conn| {
                    let mut stmt = conn
                        .prepare(
                            "SELECT id, value FROM metrics
                             WHERE type = 'gauge' AND value IS NOT NULL
                             ORDER BY id",
                        )
                        .map_err(classify)?;
                    let rows = stmt
                        .query_map([], |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                        })
                        .map_err(classify)?;
                    rows.collect::<Result<BTreeMap<String, f64>, _>>()
                        .map_err(classify)
                })
            })
            .await
    }

    async fn get_all_counters(&self) -> Result<BTreeMap<String, i64>, CoreError> {
        self.retry
            .run("counter 목록 조회", || async {
                self.with_conn(|conn| {
                    let mut stmt = conn
                        .prepare(
                            "SELECT id, delta FROM metrics
                             WHERE type = 'counter' AND delta IS NOT NULL
                             ORDER BY id",
                        )
                        .map_err(classify)?;
                    let rows = stmt
                        .query_map([], |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                        })
                        .map_err(classify)?;
                    rows.collect::<Result<BTreeMap<String, i64>, _>>()
                        .map_err(classify)
                })
            })
            .await
    }

    async fn ping(&self) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(classify)?;
            Ok(())
        })
    }

    async fn snapshot(&self) -> Result<MetricSet, CoreError> {
        self.retry
            .run("스냅샷 조회", || async { self.snapshot_blocking() })
            .await
    }

    async fn restore(&self, set: MetricSet) -> Result<(), CoreError> {
        let count = set.len();
        self.retry
            .run("스냅샷 적재", || async { self.restore_blocking(&set) })
            .await?;
        debug!("스냅샷 적재: {count}개");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn is_durable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn gauge_last_write_wins() {
        let s = store();
        s.update_metric(&MetricRecord::gauge("Alloc", 1.0))
            .await
            .unwrap();
        s.update_metric(&MetricRecord::gauge("Alloc", 123.45))
            .await
            .unwrap();
        assert_eq!(
            s.get_metric("Alloc").await.unwrap(),
            MetricRecord::gauge("Alloc", 123.45)
        );
    }

    #[tokio::test]
    async fn counter_accumulates() {
        let s = store();
        s.update_metric(&MetricRecord::counter("PollCount", 2))
            .await
            .unwrap();
        let merged = s
            .update_metric(&MetricRecord::counter("PollCount", 3))
            .await
            .unwrap();
        assert_eq!(merged.delta, Some(5));
        assert_eq!(s.get_metric("PollCount").await.unwrap().delta, Some(5));
    }

    #[tokio::test]
    async fn missing_metric_is_not_found() {
        let s = store();
        assert!(matches!(
            s.get_metric("nope").await,
            Err(CoreError::MetricNotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn invalid_type_leaves_table_unchanged() {
        let s = store();
        s.update_metric(&MetricRecord::gauge("g", 1.0)).await.unwrap();

        let bad = MetricRecord {
            id: "g".to_string(),
            kind: MetricKind::Other("histogram".to_string()),
            value: Some(5.0),
            delta: None,
        };
        assert!(matches!(
            s.update_metric(&bad).await,
            Err(CoreError::InvalidMetricType(_))
        ));
        assert_eq!(s.get_metric("g").await.unwrap().value, Some(1.0));
    }

    #[tokio::test]
    async fn batch_with_invalid_record_rolls_back() {
        let s = store();
        s.update_metric(&MetricRecord::counter("c", 10)).await.unwrap();
        let before = s.snapshot().await.unwrap();

        let batch = vec![
            MetricRecord::counter("c", 5),
            MetricRecord::gauge("new", 1.0),
            MetricRecord::counter("bad", i64::MAX),
            MetricRecord::counter("bad", 1),
        ];
        assert!(s.update_batch(&batch).await.is_err());
        assert_eq!(s.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn batch_merges_sequentially() {
        let s = store();
        let batch = vec![
            MetricRecord::counter("c", 1),
            MetricRecord::counter("c", 2),
            MetricRecord::gauge("g", 1.0),
            MetricRecord::gauge("g", 2.0),
        ];
        s.update_batch(&batch).await.unwrap();

        let counters = s.get_all_counters().await.unwrap();
        let gauges = s.get_all_gauges().await.unwrap();
        assert_eq!(counters["c"], 3);
        assert_eq!(gauges["g"], 2.0);
        assert_eq!(counters.len(), 1);
        assert_eq!(gauges.len(), 1);
    }

    #[tokio::test]
    async fn restore_writes_records_verbatim() {
        let s = store();
        s.update_metric(&MetricRecord::counter("c", 100)).await.unwrap();

        let mut set = MetricSet::new();
        set.insert("c".to_string(), MetricRecord::counter("c", 7));
        set.insert("g".to_string(), MetricRecord::gauge("g", 0.5));
        s.restore(set.clone()).await.unwrap();

        assert_eq!(s.snapshot().await.unwrap(), set);
    }

    #[tokio::test]
    async fn ping_and_flags() {
        let s = store();
        s.ping().await.unwrap();
        assert!(s.is_durable());
        assert_eq!(s.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");
        {
            let s = SqliteStore::open(&path).unwrap();
            s.update_metric(&MetricRecord::counter("c", 4)).await.unwrap();
        }
        let s = SqliteStore::open(&path).unwrap();
        s.update_metric(&MetricRecord::counter("c", 1)).await.unwrap();
        assert_eq!(s.get_metric("c").await.unwrap().delta, Some(5));
    }
}
