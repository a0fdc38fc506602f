use crate::error::{required_object, StageError, StageResult};
use crate::transcript::TranscriptDocument;
use crate::Pipeline;
use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::VideoPaths;
use video_metadata::{VideoRecord, VideoStatus};

/// Listing row: the fields a catalog view needs, nothing internal.
#[derive(Clone, Debug, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub status: VideoStatus,
    pub duration_seconds: Option<f64>,
    pub chunk_count: Option<u32>,
    pub caption_count: Option<u32>,
    pub image_embedding_count: Option<u32>,
    pub processing_cost_estimate: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoRecord> for VideoSummary {
    fn from(record: VideoRecord) -> Self {
        Self {
            video_id: record.video_id,
            title: record.title,
            status: record.status,
            duration_seconds: record.duration_seconds,
            chunk_count: record.chunk_count,
            caption_count: record.caption_count,
            image_embedding_count: record.image_embedding_count,
            processing_cost_estimate: record.processing_cost_estimate,
            updated_at: record.updated_at,
        }
    }
}

impl Pipeline {
    /// Catalog of known videos, optionally filtered by status, sorted by id.
    pub async fn list_videos(
        &self,
        status: Option<VideoStatus>,
    ) -> StageResult<Vec<VideoSummary>> {
        let records = self.metadata.scan(status).await?;
        Ok(records.into_iter().map(VideoSummary::from).collect())
    }

    /// The full record for one video.
    pub async fn get_video_metadata(&self, video_id: &str) -> StageResult<VideoRecord> {
        self.metadata
            .get(video_id)
            .await?
            .ok_or_else(|| StageError::Precondition(format!("no record for video {video_id}")))
    }

    /// The whole transcript as plain text, words joined by spaces with
    /// punctuation attached.
    pub async fn get_full_transcript(&self, video_id: &str) -> StageResult<String> {
        let raw = required_object(
            self.storage
                .read_to_string(&VideoPaths::transcript(video_id))
                .await,
            "transcript",
        )?;
        Ok(TranscriptDocument::parse(&raw)?.full_text())
    }
}
