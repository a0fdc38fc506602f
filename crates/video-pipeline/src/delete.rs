use crate::docs::{chunk_doc_id, frame_doc_id};
use crate::error::{StageError, StageResult};
use crate::Pipeline;
use inference::VectorIndex;
use serde::Serialize;
use std::sync::Arc;
use storage::VideoPaths;

/// What a cascade deletion actually removed. Deletion is best effort and
/// idempotent: a partially-deleted video can be deleted again, and a step
/// that finds nothing to remove reports zero instead of failing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeletionSummary {
    pub raw_video_deleted: bool,
    pub derived_objects_deleted: usize,
    pub speech_points_deleted: usize,
    pub caption_points_deleted: usize,
    pub image_points_deleted: usize,
    pub record_deleted: bool,
    /// Steps that failed; the cascade continues past them.
    pub errors: Vec<String>,
}

impl Pipeline {
    /// Remove every trace of a video: raw upload, derived artifacts, vector
    /// points in all three indexes and the metadata record. Index deletions
    /// resolve points by their deterministic id prefixes, so the cascade
    /// works even when the metadata record is already gone.
    pub async fn delete_video(&self, video_id: &str) -> StageResult<DeletionSummary> {
        if video_id.is_empty() {
            return Err(StageError::InvalidInput("empty video_id".to_string()));
        }
        let mut summary = DeletionSummary::default();

        let raw_key = VideoPaths::raw_video(video_id);
        match self.storage.is_exist(&raw_key).await {
            Ok(true) => match self.storage.delete(&raw_key).await {
                Ok(()) => summary.raw_video_deleted = true,
                Err(e) => summary.errors.push(format!("raw video: {e}")),
            },
            Ok(false) => {}
            Err(e) => summary.errors.push(format!("raw video: {e}")),
        }

        match self
            .storage
            .delete_prefix(&VideoPaths::processed_prefix(video_id))
            .await
        {
            Ok(count) => summary.derived_objects_deleted = count,
            Err(e) => summary.errors.push(format!("derived artifacts: {e}")),
        }

        let chunk_prefix = chunk_doc_id(video_id, 0);
        let chunk_prefix = &chunk_prefix[..chunk_prefix.len() - 4];
        let frame_prefix = frame_doc_id(video_id, 0);
        let frame_prefix = &frame_prefix[..frame_prefix.len() - 4];
        summary.speech_points_deleted = self
            .purge_index(&self.indexes.speech, "speech", chunk_prefix, &mut summary.errors)
            .await;
        summary.caption_points_deleted = self
            .purge_index(&self.indexes.captions, "captions", frame_prefix, &mut summary.errors)
            .await;
        summary.image_points_deleted = self
            .purge_index(&self.indexes.images, "images", frame_prefix, &mut summary.errors)
            .await;

        match self.metadata.delete(video_id).await {
            Ok(existed) => summary.record_deleted = existed,
            Err(e) => summary.errors.push(format!("metadata record: {e}")),
        }

        tracing::info!(
            video_id,
            raw = summary.raw_video_deleted,
            objects = summary.derived_objects_deleted,
            speech = summary.speech_points_deleted,
            captions = summary.caption_points_deleted,
            images = summary.image_points_deleted,
            errors = summary.errors.len(),
            "video deleted"
        );
        Ok(summary)
    }

    /// Delete every point whose id starts with `id_prefix`, then resync so
    /// the index stops serving the removed points.
    async fn purge_index(
        &self,
        index: &Arc<dyn VectorIndex>,
        name: &str,
        id_prefix: &str,
        errors: &mut Vec<String>,
    ) -> usize {
        let ids = match index.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                errors.push(format!("{name} index list: {e}"));
                return 0;
            }
        };
        let ids = ids
            .into_iter()
            .filter(|id| id.starts_with(id_prefix))
            .collect::<Vec<_>>();
        if ids.is_empty() {
            return 0;
        }
        let deleted = match index.delete(ids).await {
            Ok(deleted) => deleted,
            Err(e) => {
                errors.push(format!("{name} index delete: {e}"));
                return 0;
            }
        };
        if let Err(e) = index.resync().await {
            errors.push(format!("{name} index resync: {e}"));
        }
        deleted
    }
}
