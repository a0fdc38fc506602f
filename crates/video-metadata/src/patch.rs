use crate::record::VideoRecord;
use crate::status::{TranscriptionStatus, VideoStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Field-scoped partial update of a [`VideoRecord`], the only write path for
/// stages. Every field is optional and applied independently, so concurrent
/// stages that patch disjoint field sets cannot clobber each other.
///
/// Field ownership per stage:
/// - upload/orchestrator: `status`, `size_bytes`, `raw_key`, `transcript_key`,
///   `transcribe_job_name`, `add_cost`
/// - transcription poller: `transcription_status`, `error_message`
/// - frame sampler: `status`, `duration_seconds`, `frame_count`,
///   `frames_prefix`, `add_cost`
/// - caption stage: `status`, `caption_count`, `caption_index_prefix`, `add_cost`
/// - speech stage: `status`, `chunk_count`, `total_words`,
///   `speech_index_prefix`, `add_cost`
/// - image embedding stage: `status`, `image_embedding_count`,
///   `image_index_prefix`, `add_cost`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VideoPatch {
    pub status: Option<VideoStatus>,
    pub transcription_status: Option<TranscriptionStatus>,
    pub size_bytes: Option<u64>,
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
    /// Added to the running total, never overwriting it.
    pub add_cost: Option<f64>,
    pub error_message: Option<String>,
}

impl VideoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: VideoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_transcription_status(mut self, status: TranscriptionStatus) -> Self {
        self.transcription_status = Some(status);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.add_cost = Some(cost);
        self
    }

    /// Apply to a record. Status writes are rank-guarded: a patch that would
    /// regress the status is dropped (with a warning) rather than applied,
    /// which makes duplicate or out-of-order stage deliveries harmless.
    pub fn apply(&self, record: &mut VideoRecord) {
        if let Some(status) = self.status {
            if record.status.can_advance_to(status) {
                record.status = status;
            } else if record.status != status {
                tracing::warn!(
                    video_id = %record.video_id,
                    current = %record.status,
                    requested = %status,
                    "ignoring status regression"
                );
            }
        }
        if let Some(ts) = self.transcription_status {
            record.transcription_status = ts;
        }
        if let Some(v) = self.size_bytes {
            record.size_bytes = Some(v);
        }
        if let Some(v) = self.duration_seconds {
            record.duration_seconds = Some(v);
        }
        if let Some(v) = self.frame_count {
            record.frame_count = Some(v);
        }
        if let Some(v) = self.chunk_count {
            record.chunk_count = Some(v);
        }
        if let Some(v) = self.caption_count {
            record.caption_count = Some(v);
        }
        if let Some(v) = self.image_embedding_count {
            record.image_embedding_count = Some(v);
        }
        if let Some(v) = self.total_words {
            record.total_words = Some(v);
        }
        if let Some(v) = &self.raw_key {
            record.raw_key = Some(v.clone());
        }
        if let Some(v) = &self.transcript_key {
            record.transcript_key = Some(v.clone());
        }
        if let Some(v) = &self.frames_prefix {
            record.frames_prefix = Some(v.clone());
        }
        if let Some(v) = &self.speech_index_prefix {
            record.speech_index_prefix = Some(v.clone());
        }
        if let Some(v) = &self.caption_index_prefix {
            record.caption_index_prefix = Some(v.clone());
        }
        if let Some(v) = &self.image_index_prefix {
            record.image_index_prefix = Some(v.clone());
        }
        if let Some(v) = &self.transcribe_job_name {
            record.transcribe_job_name = Some(v.clone());
        }
        if let Some(cost) = self.add_cost {
            record.processing_cost_estimate += cost;
        }
        if let Some(v) = &self.error_message {
            record.error_message = Some(v.clone());
        }
        record.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::VideoRecord;

    #[test]
    fn test_disjoint_patches_do_not_clobber() {
        let mut record = VideoRecord::new("vid");

        // frame sampler fields
        let frames = VideoPatch::new()
            .with_status(VideoStatus::ExtractingFrames)
            .with_cost(0.28);
        let frames = VideoPatch {
            duration_seconds: Some(123.4),
            frame_count: Some(45),
            frames_prefix: Some("vid/frames".into()),
            ..frames
        };
        // poller fields, racing the frame branch
        let poll = VideoPatch::new().with_transcription_status(TranscriptionStatus::Completed);

        frames.apply(&mut record);
        poll.apply(&mut record);

        assert_eq!(record.duration_seconds, Some(123.4));
        assert_eq!(record.frame_count, Some(45));
        assert_eq!(record.transcription_status, TranscriptionStatus::Completed);
        assert_eq!(record.status, VideoStatus::ExtractingFrames);
    }

    #[test]
    fn test_status_never_regresses() {
        let mut record = VideoRecord::new("vid");
        VideoPatch::new()
            .with_status(VideoStatus::SpeechIndexReady)
            .apply(&mut record);
        VideoPatch::new()
            .with_status(VideoStatus::ExtractingFrames)
            .apply(&mut record);
        assert_eq!(record.status, VideoStatus::SpeechIndexReady);

        VideoPatch::new()
            .with_status(VideoStatus::Error)
            .with_error("boom")
            .apply(&mut record);
        assert_eq!(record.status, VideoStatus::Error);
        assert_eq!(record.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_cost_is_additive() {
        let mut record = VideoRecord::new("vid");
        VideoPatch::new().with_cost(0.1).apply(&mut record);
        VideoPatch::new().with_cost(0.27).apply(&mut record);
        assert!((record.processing_cost_estimate - 0.37).abs() < 1e-9);
    }
}
