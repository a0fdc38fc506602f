use crate::docs::IndexDocument;
use crate::error::{StageError, StageResult};
use crate::Pipeline;
use inference::VectorPoint;
use storage::VideoPaths;
use video_metadata::VideoPatch;

impl Pipeline {
    /// Embed the generated captions into the caption index. Text search over
    /// captions and over speech use the same embedding model, but the two
    /// indexes stay separate so their results can be merged or weighted by
    /// the caller.
    pub async fn embed_captions(&self, video_id: &str) -> StageResult<u32> {
        let doc_keys = self
            .storage
            .list_prefix(&VideoPaths::caption_index_prefix(video_id))
            .await?;
        if doc_keys.is_empty() {
            return Err(StageError::Precondition(format!(
                "no caption documents for video {video_id}"
            )));
        }

        let mut points = Vec::with_capacity(doc_keys.len());
        for key in &doc_keys {
            let parsed: IndexDocument =
                serde_json::from_str(&self.storage.read_to_string(key).await?)?;
            let IndexDocument::Caption(doc) = parsed else {
                tracing::warn!(video_id, key, "unexpected document type under caption prefix");
                continue;
            };
            let vector = match self.inference.text_embedder.embed_text(&doc.caption).await {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::warn!(
                        video_id,
                        frame_number = doc.frame_number,
                        error = %e,
                        "caption embedding failed, skipping"
                    );
                    continue;
                }
            };
            points.push(VectorPoint {
                id: doc.frame_id.clone(),
                vector,
                metadata: serde_json::json!({
                    "video_id": video_id,
                    "frame_number": doc.frame_number,
                    "timestamp_sec": doc.frame_timestamp_sec,
                    "caption": doc.caption,
                    "frame_key": doc.frame_key,
                }),
            });
        }

        if points.is_empty() {
            return Err(StageError::Upstream(format!(
                "all {} captions failed embedding",
                doc_keys.len()
            )));
        }
        let embedded = points.len() as u32;
        self.indexes
            .captions
            .upsert(points)
            .await
            .map_err(StageError::upstream)?;
        tracing::info!(video_id, embedded, "caption index updated");

        self.metadata
            .update(
                video_id,
                VideoPatch::new().with_cost(embedded as f64 * self.config.cost.per_text_embedding),
            )
            .await?;
        self.maybe_mark_ready(video_id).await?;

        Ok(embedded)
    }
}
