//! 저장소 계약 통합 테스트.
//!
//! 두 백엔드가 같은 입력 순서에 대해 같은 결과를 내는지, 백업 파일을 통해
//! 상태가 보존되는지 확인한다.

use std::sync::Arc;

use mcollect_core::error::CoreError;
use mcollect_core::models::{MetricKind, MetricRecord};
use mcollect_core::ports::store::MetricsStore;
use mcollect_storage::{BackupManager, MemStorage, SqliteStore};

fn backends() -> Vec<Arc<dyn MetricsStore>> {
    vec![
        Arc::new(MemStorage::new()),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
    ]
}

fn updates() -> Vec<MetricRecord> {
    vec![
        MetricRecord::gauge("Alloc", 10.0),
        MetricRecord::counter("PollCount", 5),
        MetricRecord::gauge("Alloc", 20.5),
        MetricRecord::counter("PollCount", 7),
        MetricRecord::gauge("RandomValue", 0.25),
        MetricRecord::counter("Requests", 1),
    ]
}

#[tokio::test]
async fn backends_agree_on_merge_results() {
    let mut snapshots = Vec::new();
    for store in backends() {
        for record in updates() {
            store.update_metric(&record).await.unwrap();
        }
        assert_eq!(store.get_metric("Alloc").await.unwrap().value, Some(20.5));
        assert_eq!(store.get_metric("PollCount").await.unwrap().delta, Some(12));
        snapshots.push(store.snapshot().await.unwrap());
    }
    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn kind_change_replaces_record() {
    for store in backends() {
        store
            .update_metric(&MetricRecord::gauge("m", 3.0))
            .await
            .unwrap();
        store
            .update_metric(&MetricRecord::counter("m", 2))
            .await
            .unwrap();

        let record = store.get_metric("m").await.unwrap();
        assert_eq!(record.kind, MetricKind::Counter, "{}", store.backend_name());
        assert_eq!(record.delta, Some(2));
        assert!(store.get_all_gauges().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn invalid_records_are_rejected_by_both() {
    for store in backends() {
        let nan = MetricRecord::gauge("g", f64::NAN);
        assert!(matches!(
            store.update_metric(&nan).await,
            Err(CoreError::InvalidGaugeValue(_))
        ));

        let mismatched = MetricRecord {
            id: "c".to_string(),
            kind: MetricKind::Counter,
            value: Some(1.0),
            delta: None,
        };
        assert!(store.update_metric(&mismatched).await.is_err());
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn sqlite_state_carries_over_through_backup_file() {
    let dir = tempfile::tempdir().unwrap();
    let backup = BackupManager::new(dir.path().join("metrics-db.json"));

    let durable = SqliteStore::open_in_memory().unwrap();
    durable.update_batch(&updates()).await.unwrap();
    backup.save_snapshot(&durable).await.unwrap();

    let memory = MemStorage::new();
    backup.load_snapshot(&memory).await.unwrap();
    assert_eq!(
        memory.snapshot().await.unwrap(),
        durable.snapshot().await.unwrap()
    );

    // 복원 후에도 counter는 계속 누적
    memory
        .update_metric(&MetricRecord::counter("PollCount", 1))
        .await
        .unwrap();
    assert_eq!(memory.get_metric("PollCount").await.unwrap().delta, Some(13));
}
