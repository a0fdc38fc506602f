use crate::docs::{frame_doc_id, ImageEmbeddingDocument, IndexDocument};
use crate::error::{StageError, StageResult};
use crate::sampling::frame_timestamp;
use crate::Pipeline;
use chrono::Utc;
use inference::VectorPoint;
use storage::VideoPaths;
use video_metadata::{VideoPatch, VideoStatus};

impl Pipeline {
    /// Embed the extracted frames with the multimodal model and upsert them
    /// into the image index. Independent of captioning: a frame the vision
    /// model could not describe can still be found by visual similarity.
    pub async fn embed_images(&self, video_id: &str) -> StageResult<u32> {
        let record = self
            .metadata
            .get(video_id)
            .await?
            .ok_or_else(|| StageError::Precondition(format!("no record for video {video_id}")))?;
        let duration = record.duration_seconds.ok_or_else(|| {
            StageError::Precondition(format!("video {video_id} has no recorded duration"))
        })?;

        let frame_keys = self
            .storage
            .list_prefix(&VideoPaths::frames_prefix(video_id))
            .await?;
        if frame_keys.is_empty() {
            return Err(StageError::Precondition(format!(
                "no extracted frames for video {video_id}"
            )));
        }

        let total = frame_keys.len();
        let mut points = Vec::with_capacity(total);
        for frame_key in &frame_keys {
            let Some(frame_number) = VideoPaths::frame_number(frame_key) else {
                tracing::warn!(video_id, frame_key, "unrecognized frame key, skipping");
                continue;
            };
            let image = self.storage.get(frame_key).await?;
            let vector = match self
                .inference
                .image_embedder
                .embed_image(bytes::Bytes::from(image.to_vec()))
                .await
            {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::warn!(video_id, frame_number, error = %e, "image embedding failed, skipping");
                    continue;
                }
            };

            let frame_id = frame_doc_id(video_id, frame_number);
            let timestamp_sec = frame_timestamp(frame_number, total, duration);
            let doc = ImageEmbeddingDocument {
                video_id: video_id.to_string(),
                frame_id: frame_id.clone(),
                frame_number,
                frame_timestamp_sec: timestamp_sec,
                frame_key: frame_key.clone(),
                embedding_dimension: vector.len(),
                embedding: vector.clone(),
                generated_at: Utc::now(),
            };
            self.storage
                .put(
                    &VideoPaths::image_embedding(video_id, frame_number),
                    serde_json::to_vec(&IndexDocument::Image(doc))?,
                )
                .await?;

            points.push(VectorPoint {
                id: frame_id,
                vector,
                metadata: serde_json::json!({
                    "video_id": video_id,
                    "frame_number": frame_number,
                    "timestamp_sec": timestamp_sec,
                    "frame_key": frame_key,
                }),
            });
        }

        if points.is_empty() {
            return Err(StageError::Upstream(format!(
                "all {total} frames failed embedding"
            )));
        }
        let embedded = points.len() as u32;
        self.indexes
            .images
            .upsert(points)
            .await
            .map_err(StageError::upstream)?;
        tracing::info!(video_id, embedded, total, "image index updated");

        self.metadata
            .update(
                video_id,
                VideoPatch {
                    status: Some(VideoStatus::ImageIndexReady),
                    image_embedding_count: Some(embedded),
                    image_index_prefix: Some(VideoPaths::image_index_prefix(video_id)),
                    add_cost: Some(embedded as f64 * self.config.cost.per_image_embedding),
                    ..VideoPatch::new()
                },
            )
            .await?;
        self.maybe_mark_ready(video_id).await?;

        Ok(embedded)
    }
}
