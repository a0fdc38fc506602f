mod error;
mod paths;

pub use bytes::Bytes;
pub use error::{StorageError, StorageResult};
use opendal::services::{Fs, Memory};
pub use opendal::Buffer;
use opendal::{ErrorKind, Operator};
use std::path::Path;
pub use paths::VideoPaths;

/// Content-addressed-by-key object store. Keys are `/`-separated strings,
/// not filesystem paths; the fs service is one possible backend.
#[derive(Clone, Debug)]
pub struct ObjectStorage {
    op: Operator,
}

impl ObjectStorage {
    pub fn new_fs(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root
            .as_ref()
            .to_str()
            .ok_or_else(|| StorageError::NotFound("invalid storage root".to_string()))?;
        let mut builder = Fs::default();
        builder.root(root);
        let op: Operator = Operator::new(builder)?.finish();
        Ok(Self { op })
    }

    /// Purely in-memory backend, used by tests and embedded runs.
    pub fn new_memory() -> StorageResult<Self> {
        let builder = Memory::default();
        let op: Operator = Operator::new(builder)?.finish();
        Ok(Self { op })
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    pub async fn is_exist(&self, key: &str) -> StorageResult<bool> {
        self.op.is_exist(key).await.map_err(StorageError::from)
    }

    /// Object size in bytes without reading the body.
    pub async fn stat_size(&self, key: &str) -> StorageResult<u64> {
        let meta = self.op.stat(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::from(e)
            }
        })?;
        Ok(meta.content_length())
    }

    /// Write an object, creating intermediate "directories" as needed.
    pub async fn put(&self, key: &str, bs: impl Into<Buffer>) -> StorageResult<()> {
        self.op.write(key, bs).await.map_err(StorageError::from)
    }

    pub async fn get(&self, key: &str) -> StorageResult<Buffer> {
        self.op.read(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::from(e)
            }
        })
    }

    pub async fn read_to_string(&self, key: &str) -> StorageResult<String> {
        let buffer = self.get(key).await?;
        String::from_utf8(buffer.to_vec()).map_err(StorageError::from)
    }

    /// List all object keys under a prefix, recursively. Directory
    /// placeholder entries are filtered out.
    pub async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        let entries = match self.op.list_with(prefix.as_str()).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(StorageError::from(e)),
        };
        let mut keys = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|path| !path.ends_with('/'))
            .collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.op.delete(key).await.map_err(StorageError::from)
    }

    pub async fn delete_batch(&self, keys: Vec<String>) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.op.remove(keys).await.map_err(StorageError::from)
    }

    /// Delete every object under a prefix. Returns the number of objects
    /// removed; batches keep parity with bulk-delete object stores.
    pub async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let keys = self.list_prefix(prefix).await?;
        let deleted = keys.len();
        for batch in keys.chunks(1000) {
            self.op
                .remove(batch.to_vec())
                .await
                .map_err(StorageError::from)?;
        }
        // drop the now-empty prefix itself
        self.op
            .remove_all(prefix)
            .await
            .map_err(StorageError::from)?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_put_get_roundtrip() {
        let storage = ObjectStorage::new_memory().expect("memory storage");
        storage
            .put("vid/transcript.json", Bytes::from_static(b"{}"))
            .await
            .expect("put");
        let content = storage
            .read_to_string("vid/transcript.json")
            .await
            .expect("get");
        assert_eq!(content, "{}");
    }

    #[test_log::test(tokio::test)]
    async fn test_get_missing_is_not_found() {
        let storage = ObjectStorage::new_memory().expect("memory storage");
        let err = storage.get("nope.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_and_delete_prefix() {
        let storage = ObjectStorage::new_memory().expect("memory storage");
        for n in 1..=3u32 {
            storage
                .put(&VideoPaths::frame("vid", n), Bytes::from_static(b"jpg"))
                .await
                .expect("put frame");
        }
        storage
            .put("other/file.json", Bytes::from_static(b"{}"))
            .await
            .expect("put other");

        let keys = storage.list_prefix("vid/frames").await.expect("list");
        assert_eq!(
            keys,
            vec![
                "vid/frames/frame_0001.jpg",
                "vid/frames/frame_0002.jpg",
                "vid/frames/frame_0003.jpg",
            ]
        );

        let deleted = storage
            .delete_prefix(&VideoPaths::processed_prefix("vid"))
            .await
            .expect("delete prefix");
        assert_eq!(deleted, 3);
        assert!(storage.list_prefix("vid/").await.expect("list").is_empty());
        // unrelated prefixes untouched
        assert_eq!(storage.list_prefix("other").await.expect("list").len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_missing_prefix_is_empty() {
        let storage = ObjectStorage::new_memory().expect("memory storage");
        assert!(storage
            .list_prefix("ghost/frames")
            .await
            .expect("list")
            .is_empty());
    }
}
