use crate::patch::VideoPatch;
use crate::record::VideoRecord;
use crate::status::VideoStatus;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("metadata store error: {0}")]
    Backend(String),
}

/// Persistent record store keyed by `video_id`. Updates are field-scoped
/// patches applied atomically; implementations must never require
/// read-modify-write of the whole record from callers.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, video_id: &str) -> MetadataResult<Option<VideoRecord>>;

    async fn put(&self, record: VideoRecord) -> MetadataResult<()>;

    /// Apply a patch to an existing record and return the updated record.
    async fn update(&self, video_id: &str, patch: VideoPatch) -> MetadataResult<VideoRecord>;

    /// Returns whether a record existed.
    async fn delete(&self, video_id: &str) -> MetadataResult<bool>;

    async fn scan(&self, status: Option<VideoStatus>) -> MetadataResult<Vec<VideoRecord>>;
}

/// In-memory store for tests and embedded runs. A deployed pipeline points
/// this trait at a managed key-value table instead.
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    records: Arc<RwLock<HashMap<String, VideoRecord>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, video_id: &str) -> MetadataResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(video_id).cloned())
    }

    async fn put(&self, record: VideoRecord) -> MetadataResult<()> {
        self.records
            .write()
            .await
            .insert(record.video_id.clone(), record);
        Ok(())
    }

    async fn update(&self, video_id: &str, patch: VideoPatch) -> MetadataResult<VideoRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(video_id)
            .ok_or_else(|| MetadataError::NotFound(video_id.to_string()))?;
        patch.apply(record);
        Ok(record.clone())
    }

    async fn delete(&self, video_id: &str) -> MetadataResult<bool> {
        Ok(self.records.write().await.remove(video_id).is_some())
    }

    async fn scan(&self, status: Option<VideoStatus>) -> MetadataResult<Vec<VideoRecord>> {
        let records = self.records.read().await;
        let mut result = records
            .values()
            .filter(|record| status.map_or(true, |s| record.status == s))
            .cloned()
            .collect::<Vec<_>>();
        result.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_update_missing_record() {
        let store = MemoryMetadataStore::new();
        let err = store.update("ghost", VideoPatch::new()).await.unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_put_update_scan() {
        let store = MemoryMetadataStore::new();
        store.put(VideoRecord::new("a")).await.expect("put");
        store.put(VideoRecord::new("b")).await.expect("put");

        let updated = store
            .update("a", VideoPatch::new().with_status(VideoStatus::Transcribing))
            .await
            .expect("update");
        assert_eq!(updated.status, VideoStatus::Transcribing);

        let transcribing = store
            .scan(Some(VideoStatus::Transcribing))
            .await
            .expect("scan");
        assert_eq!(transcribing.len(), 1);
        assert_eq!(transcribing[0].video_id, "a");

        assert!(store.delete("a").await.expect("delete"));
        assert!(!store.delete("a").await.expect("delete"));
        assert!(store.get("a").await.expect("get").is_none());
    }
}
