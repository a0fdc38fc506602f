use crate::status::{TranscriptionStatus, VideoStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent per-video record. Created once by the upload stage and mutated
/// exclusively through field-scoped [`crate::VideoPatch`]es by the stage that
/// currently owns the video.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    /// Human-readable title derived from the uploaded filename.
    pub title: String,
    pub status: VideoStatus,
    pub transcription_status: TranscriptionStatus,

    pub size_bytes: Option<u64>,
    /// Set once by the frame sampler, read by both embedding branches.
    pub duration_seconds: Option<f64>,
    pub frame_count: Option<u32>,
    pub chunk_count: Option<u32>,
    pub caption_count: Option<u32>,
    pub image_embedding_count: Option<u32>,
    pub total_words: Option<u32>,

    pub raw_key: Option<String>,
    pub transcript_key: Option<String>,
    pub frames_prefix: Option<String>,
    pub speech_index_prefix: Option<String>,
    pub caption_index_prefix: Option<String>,
    pub image_index_prefix: Option<String>,
    pub transcribe_job_name: Option<String>,

    /// Monotonically increasing running total; patches add to it, never set it.
    pub processing_cost_estimate: f64,

    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(video_id: &str) -> Self {
        let now = Utc::now();
        Self {
            video_id: video_id.to_string(),
            title: title_from_video_id(video_id),
            status: VideoStatus::Uploaded,
            transcription_status: TranscriptionStatus::Pending,
            size_bytes: None,
            duration_seconds: None,
            frame_count: None,
            chunk_count: None,
            caption_count: None,
            image_embedding_count: None,
            total_words: None,
            raw_key: None,
            transcript_key: None,
            frames_prefix: None,
            speech_index_prefix: None,
            caption_index_prefix: None,
            image_index_prefix: None,
            transcribe_job_name: None,
            processing_cost_estimate: 0.0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All three indexes populated, which is the `Ready` promotion condition.
    pub fn all_indexes_ready(&self) -> bool {
        self.chunk_count.unwrap_or(0) > 0
            && self.caption_count.unwrap_or(0) > 0
            && self.image_embedding_count.unwrap_or(0) > 0
    }
}

/// `"youtube-short_video"` -> `"Youtube Short Video"`.
pub fn title_from_video_id(video_id: &str) -> String {
    video_id
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_title_from_video_id() {
        assert_eq!(title_from_video_id("youtube-short-video"), "Youtube Short Video");
        assert_eq!(title_from_video_id("demo_clip"), "Demo Clip");
        assert_eq!(title_from_video_id("solo"), "Solo");
    }

    #[test]
    fn test_index_readiness() {
        let mut record = VideoRecord::new("vid");
        assert!(!record.all_indexes_ready());
        record.chunk_count = Some(6);
        record.caption_count = Some(45);
        record.image_embedding_count = Some(45);
        assert!(record.all_indexes_ready());
    }
}
