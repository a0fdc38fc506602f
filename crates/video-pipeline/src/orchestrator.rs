use crate::error::{required_object, StageError, StageResult};
use crate::scheduler::StageInvocation;
use crate::Pipeline;
use chrono::Utc;
use inference::TranscriptionRequest;
use std::time::Duration;
use storage::VideoPaths;
use video_metadata::{VideoPatch, VideoRecord, VideoStatus};

/// Result of a `start_pipeline` call.
#[derive(Clone, Debug, PartialEq)]
pub enum StartOutcome {
    Started { job_name: String },
    /// The video is already being processed or is done; nothing was started.
    AlreadyProcessing { status: VideoStatus },
}

impl Pipeline {
    /// Kick off processing for an uploaded video: create (or reset) the
    /// record, start the transcription job and fan out the two branches.
    /// Idempotent by status guard: a video that is in flight or ready is
    /// skipped so duplicate upload notifications never double-charge.
    /// `Uploaded` and `Error` records are restarted from scratch.
    pub async fn start_pipeline(&self, video_id: &str) -> StageResult<StartOutcome> {
        if video_id.is_empty() {
            return Err(StageError::InvalidInput("empty video_id".to_string()));
        }

        if let Some(existing) = self.metadata.get(video_id).await? {
            if existing.status.blocks_reprocessing() {
                tracing::info!(video_id, status = %existing.status, "skipping reprocess");
                return Ok(StartOutcome::AlreadyProcessing {
                    status: existing.status,
                });
            }
        }

        let raw_key = VideoPaths::raw_video(video_id);
        let size_bytes = required_object(self.storage.stat_size(&raw_key).await, "raw video")?;

        // fresh record; a retry after Error starts over rather than resuming
        self.metadata.put(VideoRecord::new(video_id)).await?;

        let transcript_key = VideoPaths::transcript(video_id);
        let job_name = transcription_job_name(video_id);
        self.inference
            .transcription
            .start_job(
                &job_name,
                TranscriptionRequest {
                    media_key: raw_key.clone(),
                    output_key: transcript_key.clone(),
                    language_code: self.config.language_code.clone(),
                    max_speaker_labels: self.config.max_speaker_labels,
                },
            )
            .await
            .map_err(StageError::upstream)?;

        self.metadata
            .update(
                video_id,
                VideoPatch {
                    status: Some(VideoStatus::Transcribing),
                    size_bytes: Some(size_bytes),
                    raw_key: Some(raw_key),
                    transcript_key: Some(transcript_key),
                    transcribe_job_name: Some(job_name.clone()),
                    add_cost: Some(self.config.cost.estimate_transcription(size_bytes)),
                    ..VideoPatch::new()
                },
            )
            .await?;

        self.schedule_next(
            StageInvocation::PollTranscription {
                video_id: video_id.to_string(),
                job_name: job_name.clone(),
                attempt: 1,
            },
            self.config.poll_interval,
        )
        .await;
        self.schedule_next(
            StageInvocation::ExtractFrames {
                video_id: video_id.to_string(),
            },
            Duration::ZERO,
        )
        .await;

        tracing::info!(video_id, job_name, size_bytes, "pipeline started");
        Ok(StartOutcome::Started { job_name })
    }

    /// Run one scheduled invocation, recording fatal failures on the video's
    /// record. This is the single entry point a worker loop drives.
    pub async fn dispatch(&self, invocation: StageInvocation) -> StageResult<()> {
        let video_id = invocation.video_id().to_string();
        let stage = invocation.stage_name();
        let result = match invocation {
            StageInvocation::PollTranscription {
                video_id,
                job_name,
                attempt,
            } => self
                .poll_transcription(&video_id, &job_name, attempt)
                .await
                .map(|_| ()),
            StageInvocation::ExtractFrames { video_id } => {
                self.extract_frames(&video_id).await.map(|_| ())
            }
            StageInvocation::GenerateCaptions { video_id } => {
                self.generate_captions(&video_id).await.map(|_| ())
            }
            StageInvocation::BuildSpeechIndex { video_id } => {
                self.build_speech_index(&video_id).await.map(|_| ())
            }
            StageInvocation::EmbedCaptions { video_id } => {
                self.embed_captions(&video_id).await.map(|_| ())
            }
            StageInvocation::EmbedImages { video_id } => {
                self.embed_images(&video_id).await.map(|_| ())
            }
        };

        if let Err(err) = &result {
            tracing::error!(video_id = %video_id, stage, error = %err, "stage failed");
            if err.records_error_status() {
                self.record_failure(&video_id, stage, err).await;
            }
        }
        result
    }

    /// Fire-and-forget successor trigger. A lost trigger never rolls back
    /// the committed stage; the successor can be re-invoked manually.
    pub(crate) async fn schedule_next(&self, invocation: StageInvocation, delay: Duration) {
        let stage = invocation.stage_name();
        let video_id = invocation.video_id().to_string();
        if let Err(e) = self.scheduler.schedule(invocation, delay).await {
            tracing::warn!(video_id = %video_id, stage, error = %e, "could not trigger next stage");
        }
    }

    /// Promote to `Ready` once the speech, caption and image indexes all
    /// have content. Called by whichever index stage finishes last.
    pub(crate) async fn maybe_mark_ready(&self, video_id: &str) -> StageResult<()> {
        let Some(record) = self.metadata.get(video_id).await? else {
            return Ok(());
        };
        if record.status != VideoStatus::Ready && record.all_indexes_ready() {
            tracing::info!(video_id, "all indexes ready");
            self.metadata
                .update(video_id, VideoPatch::new().with_status(VideoStatus::Ready))
                .await?;
        }
        Ok(())
    }

    /// Best effort: failing to record a failure must not mask the original
    /// error.
    pub(crate) async fn record_failure(&self, video_id: &str, stage: &str, err: &StageError) {
        let patch = VideoPatch::new()
            .with_status(VideoStatus::Error)
            .with_error(format!("{stage}: {err}"));
        if let Err(update_err) = self.metadata.update(video_id, patch).await {
            tracing::warn!(video_id, stage, error = %update_err, "could not record stage failure");
        }
    }
}

/// Unique, oracle-safe job name. Video ids come from uploaded filenames, so
/// spaces, brackets and other characters the transcription service rejects
/// are dropped; the timestamp salt keeps retries distinct.
fn transcription_job_name(video_id: &str) -> String {
    let cleaned = video_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>();
    format!("transcribe-{cleaned}-{}", Utc::now().timestamp())
}
