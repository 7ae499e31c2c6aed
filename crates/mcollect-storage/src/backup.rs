//! 저장소 백업/복원.
//!
//! 저장소 전체를 JSON 객체(id → 레코드) 하나로 파일에 저장하고,
//! 부팅 시 다시 적재한다. 파일은 임시 파일에 쓴 뒤 교체한다.

use mcollect_core::error::CoreError;
use mcollect_core::models::MetricSet;
use mcollect_core::ports::store::MetricsStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// 파일 백업 관리자
#[derive(Debug, Clone)]
pub struct BackupManager {
    path: PathBuf,
}

impl BackupManager {
    /// 새 백업 관리자 생성
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 백업 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 임시 파일 경로 (같은 디렉토리)
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// 저장소 스냅샷을 파일로 저장, 저장한 레코드 수 반환
    pub async fn save_snapshot(&self, store: &dyn MetricsStore) -> Result<usize, CoreError> {
        let set = store.snapshot().await?;
        self.write_set(&set).await?;
        debug!("백업 저장: {}개 → {}", set.len(), self.path.display());
        Ok(set.len())
    }

    /// 파일에서 저장소로 적재, 적재한 레코드 수 반환
    ///
    /// 파일이 없거나 비어 있으면 아무것도 하지 않는다.
    pub async fn load_snapshot(&self, store: &dyn MetricsStore) -> Result<usize, CoreError> {
        let Some(set) = self.read_set().await? else {
            info!("백업 파일 없음, 복원 생략: {}", self.path.display());
            return Ok(0);
        };

        let count = set.len();
        store.restore(set).await?;
        info!("백업 복원: {count}개 ← {}", self.path.display());
        Ok(count)
    }

    /// 메트릭 집합을 원자적으로 기록
    pub async fn write_set(&self, set: &MetricSet) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(set)?;
        let tmp = self.temp_path();
        fs::write(&tmp, &json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// 파일에서 메트릭 집합 읽기 (없거나 비어 있으면 None)
    ///
    /// 키와 레코드 id가 다르면 레코드 id를 따른다.
    pub async fn read_set(&self) -> Result<Option<MetricSet>, CoreError> {
        let content = match fs::read(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let raw: MetricSet = serde_json::from_slice(&content)?;
        let mut set = MetricSet::new();
        for (key, record) in raw {
            if key != record.id {
                warn!("백업 키 불일치: {key} ≠ {}, 레코드 id 사용", record.id);
            }
            set.insert(record.id.clone(), record);
        }
        Ok(Some(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemStorage;
    use mcollect_core::models::MetricRecord;

    async fn populated() -> MemStorage {
        let store = MemStorage::new();
        store
            .update_batch(&[
                MetricRecord::gauge("Alloc", 123.45),
                MetricRecord::gauge("RandomValue", 0.5),
                MetricRecord::counter("PollCount", 42),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn roundtrip_into_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupManager::new(dir.path().join("metrics-db.json"));

        let source = populated().await;
        assert_eq!(backup.save_snapshot(&source).await.unwrap(), 3);

        let fresh = MemStorage::new();
        assert_eq!(backup.load_snapshot(&fresh).await.unwrap(), 3);
        assert_eq!(
            fresh.snapshot().await.unwrap(),
            source.snapshot().await.unwrap()
        );
    }

    #[tokio::test]
    async fn missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupManager::new(dir.path().join("absent.json"));
        let store = MemStorage::new();
        assert_eq!(backup.load_snapshot(&store).await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn empty_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "\n").unwrap();

        let store = MemStorage::new();
        assert_eq!(
            BackupManager::new(&path).load_snapshot(&store).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn file_format_is_id_keyed_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics-db.json");
        BackupManager::new(&path)
            .save_snapshot(&populated().await)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["PollCount"]["type"], "counter");
        assert_eq!(value["PollCount"]["delta"], 42);
        assert_eq!(value["Alloc"]["value"], 123.45);
        assert!(value["Alloc"].get("delta").is_none());
        assert!(!path.with_file_name("metrics-db.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupManager::new(dir.path().join("db.json"));
        backup.save_snapshot(&populated().await).await.unwrap();

        let small = MemStorage::new();
        small
            .update_metric(&MetricRecord::gauge("Only", 1.0))
            .await
            .unwrap();
        backup.save_snapshot(&small).await.unwrap();

        let set = backup.read_set().await.unwrap().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("Only"));
    }

    #[tokio::test]
    async fn corrupt_file_is_error_and_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = MemStorage::new();
        assert!(matches!(
            BackupManager::new(&path).load_snapshot(&store).await,
            Err(CoreError::Serialization(_))
        ));
        assert!(store.is_empty());
    }
}
