use crate::docs::{frame_doc_id, CaptionDocument, IndexDocument};
use crate::error::{StageError, StageResult};
use crate::sampling::frame_timestamp;
use crate::scheduler::StageInvocation;
use crate::Pipeline;
use chrono::Utc;
use std::time::Duration;
use storage::VideoPaths;
use video_metadata::{VideoPatch, VideoStatus};

impl Pipeline {
    /// Caption every extracted frame with the vision model and write one
    /// caption document per frame. A frame that fails captioning is skipped
    /// with a warning; the stage only fails when no frame produced a caption.
    pub async fn generate_captions(&self, video_id: &str) -> StageResult<u32> {
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
        let mut captioned = 0u32;
        for frame_key in &frame_keys {
            let Some(frame_number) = VideoPaths::frame_number(frame_key) else {
                tracing::warn!(video_id, frame_key, "unrecognized frame key, skipping");
                continue;
            };
            let image = self.storage.get(frame_key).await?;
            let caption = match self
                .inference
                .captioner
                .caption(
                    bytes::Bytes::from(image.to_vec()),
                    &self.config.caption_prompt,
                )
                .await
            {
                Ok(caption) => caption,
                Err(e) => {
                    tracing::warn!(video_id, frame_number, error = %e, "captioning failed, skipping frame");
                    continue;
                }
            };

            let doc = CaptionDocument {
                video_id: video_id.to_string(),
                frame_id: frame_doc_id(video_id, frame_number),
                frame_number,
                frame_timestamp_sec: frame_timestamp(frame_number, total, duration),
                caption,
                frame_key: frame_key.clone(),
                generated_at: Utc::now(),
            };
            self.storage
                .put(
                    &VideoPaths::caption(video_id, frame_number),
                    serde_json::to_vec(&IndexDocument::Caption(doc))?,
                )
                .await?;
            captioned += 1;
        }

        if captioned == 0 {
            return Err(StageError::Upstream(format!(
                "all {total} frames failed captioning"
            )));
        }
        tracing::info!(video_id, captioned, total, "captions generated");

        self.metadata
            .update(
                video_id,
                VideoPatch {
                    status: Some(VideoStatus::CaptionsReady),
                    caption_count: Some(captioned),
                    caption_index_prefix: Some(VideoPaths::caption_index_prefix(video_id)),
                    add_cost: Some(captioned as f64 * self.config.cost.per_caption),
                    ..VideoPatch::new()
                },
            )
            .await?;

        self.schedule_next(
            StageInvocation::EmbedCaptions {
                video_id: video_id.to_string(),
            },
            Duration::ZERO,
        )
        .await;

        Ok(captioned)
    }
}
