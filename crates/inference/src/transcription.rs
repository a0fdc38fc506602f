use async_trait::async_trait;

/// Parameters for starting a transcription job.
#[derive(Clone, Debug)]
pub struct TranscriptionRequest {
    /// Object-store key of the media to transcribe.
    pub media_key: String,
    /// Object-store key the oracle writes the finished transcript to.
    pub output_key: String,
    pub language_code: String,
    /// Speaker diarization cap; `None` disables diarization.
    pub max_speaker_labels: Option<u32>,
}

/// Observed state of a transcription job. Anything outside these three states
/// is reported verbatim in `Unknown` so the poller can fail fast instead of
/// looping on a state it does not understand.
#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptionJobStatus {
    InProgress,
    Completed,
    Failed { reason: String },
    Unknown(String),
}

/// External speech-to-text service. Jobs are asynchronous: `start_job`
/// returns immediately and completion is observed by polling `job_status`.
#[async_trait]
pub trait TranscriptionOracle: Send + Sync {
    async fn start_job(&self, job_name: &str, request: TranscriptionRequest)
        -> anyhow::Result<()>;

    async fn job_status(&self, job_name: &str) -> anyhow::Result<TranscriptionJobStatus>;
}
