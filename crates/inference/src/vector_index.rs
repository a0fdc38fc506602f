use async_trait::async_trait;
use serde_json::Value;

/// One immutable vector record. Ids are deterministic
/// (`{video_id}_chunk_0000` / `{video_id}_frame_0001`), so re-running a stage
/// overwrites the same points instead of duplicating them.
#[derive(Clone, Debug)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Value,
}

#[derive(Clone, Debug)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

/// External similarity index. The pipeline owns what goes in; the index owns
/// how search works.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, points: Vec<VectorPoint>) -> anyhow::Result<()>;

    /// `video_id` filters hits to one video when present.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        video_id: Option<&str>,
    ) -> anyhow::Result<Vec<VectorHit>>;

    async fn delete(&self, ids: Vec<String>) -> anyhow::Result<usize>;

    /// List ids currently in the index, used by cascade deletion to find a
    /// video's points by deterministic id prefix.
    async fn list_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Ask the index to re-sync against its backing documents so stale
    /// entries stop being returned after a deletion.
    async fn resync(&self) -> anyhow::Result<()>;
}
