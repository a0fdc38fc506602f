use crate::error::{StageError, StageResult};
use crate::scheduler::StageInvocation;
use crate::Pipeline;
use video_metadata::{TranscriptionStatus, VideoPatch};

/// What a single poll step did. `Scheduled` means the job is still running
/// and the next step has been handed to the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Completed,
    Scheduled { next_attempt: u32 },
}

impl Pipeline {
    /// One stateless poll step against the transcription oracle. All state
    /// lives in the invocation (`attempt`) and the metadata record, so any
    /// worker can run any step; waiting is done by scheduling the next step
    /// with a delay, never by sleeping in-process.
    pub async fn poll_transcription(
        &self,
        video_id: &str,
        job_name: &str,
        attempt: u32,
    ) -> StageResult<PollOutcome> {
        let status = self
            .inference
            .transcription
            .job_status(job_name)
            .await
            .map_err(StageError::upstream)?;

        match status {
            inference::TranscriptionJobStatus::InProgress => {
                // the ceiling applies to observations, so a job that finishes
                // on the last allowed attempt still completes
                if attempt >= self.config.max_poll_attempts {
                    tracing::warn!(video_id, job_name, attempt, "transcription poll ceiling reached");
                    self.metadata
                        .update(
                            video_id,
                            VideoPatch::new()
                                .with_transcription_status(TranscriptionStatus::Timeout)
                                .with_error(format!(
                                    "transcription job {job_name} did not finish within {attempt} polls"
                                )),
                        )
                        .await?;
                    return Err(StageError::Timeout { attempts: attempt });
                }
                let next_attempt = attempt + 1;
                tracing::debug!(video_id, job_name, attempt, "transcription still in progress");
                // losing the retry would strand the job, so this scheduling
                // failure is fatal, unlike successor triggers
                self.scheduler
                    .schedule(
                        StageInvocation::PollTranscription {
                            video_id: video_id.to_string(),
                            job_name: job_name.to_string(),
                            attempt: next_attempt,
                        },
                        self.config.poll_interval,
                    )
                    .await
                    .map_err(StageError::upstream)?;
                Ok(PollOutcome::Scheduled { next_attempt })
            }
            inference::TranscriptionJobStatus::Completed => {
                tracing::info!(video_id, job_name, attempt, "transcription completed");
                self.metadata
                    .update(
                        video_id,
                        VideoPatch::new().with_transcription_status(TranscriptionStatus::Completed),
                    )
                    .await?;
                // the transcript is durable; if this trigger is lost the
                // speech stage can be re-invoked manually
                self.schedule_next(
                    StageInvocation::BuildSpeechIndex {
                        video_id: video_id.to_string(),
                    },
                    std::time::Duration::ZERO,
                )
                .await;
                Ok(PollOutcome::Completed)
            }
            inference::TranscriptionJobStatus::Failed { reason } => {
                self.metadata
                    .update(
                        video_id,
                        VideoPatch::new()
                            .with_transcription_status(TranscriptionStatus::Failed)
                            .with_error(format!("transcription job failed: {reason}")),
                    )
                    .await?;
                Err(StageError::Upstream(format!(
                    "transcription job {job_name} failed: {reason}"
                )))
            }
            inference::TranscriptionJobStatus::Unknown(state) => {
                // fail fast instead of polling a state we don't understand
                self.metadata
                    .update(
                        video_id,
                        VideoPatch::new()
                            .with_transcription_status(TranscriptionStatus::Failed)
                            .with_error(format!("transcription job in unexpected state {state}")),
                    )
                    .await?;
                Err(StageError::Upstream(format!(
                    "transcription job {job_name} in unexpected state {state}"
                )))
            }
        }
    }
}
