use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// One stage invocation, the unit of work handed to the scheduler. An
/// unknown `op` or a missing field is rejected at the boundary instead of
/// surfacing as a confusing mid-stage failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageInvocation {
    /// Re-entrant poll step; `attempt` is carried in the invocation so the
    /// poller itself stays stateless.
    PollTranscription {
        video_id: String,
        job_name: String,
        attempt: u32,
    },
    ExtractFrames { video_id: String },
    GenerateCaptions { video_id: String },
    BuildSpeechIndex { video_id: String },
    EmbedCaptions { video_id: String },
    EmbedImages { video_id: String },
}

impl StageInvocation {
    pub fn video_id(&self) -> &str {
        match self {
            StageInvocation::PollTranscription { video_id, .. }
            | StageInvocation::ExtractFrames { video_id }
            | StageInvocation::GenerateCaptions { video_id }
            | StageInvocation::BuildSpeechIndex { video_id }
            | StageInvocation::EmbedCaptions { video_id }
            | StageInvocation::EmbedImages { video_id } => video_id,
        }
    }

    /// Stable stage name for logging.
    pub fn stage_name(&self) -> &'static str {
        match self {
            StageInvocation::PollTranscription { .. } => "poll_transcription",
            StageInvocation::ExtractFrames { .. } => "extract_frames",
            StageInvocation::GenerateCaptions { .. } => "generate_captions",
            StageInvocation::BuildSpeechIndex { .. } => "build_speech_index",
            StageInvocation::EmbedCaptions { .. } => "embed_captions",
            StageInvocation::EmbedImages { .. } => "embed_images",
        }
    }
}

/// An invocation plus the delay it was scheduled with. The consumer decides
/// whether to honor the delay; tests usually don't.
#[derive(Clone, Debug)]
pub struct ScheduledInvocation {
    pub invocation: StageInvocation,
    pub delay: Duration,
}

/// Hands stage invocations off for later execution. The pipeline never
/// blocks on downstream stages: it schedules them and returns, so a deployed
/// system can back this trait with a queue service while tests and embedded
/// runs drain an in-process channel.
#[async_trait]
pub trait StageScheduler: Send + Sync {
    async fn schedule(&self, invocation: StageInvocation, delay: Duration) -> anyhow::Result<()>;
}

/// In-process scheduler over an unbounded channel. Delays are recorded on
/// the message, not slept on, so a dispatch loop stays deterministic.
#[derive(Clone)]
pub struct LocalScheduler {
    tx: mpsc::UnboundedSender<ScheduledInvocation>,
}

impl LocalScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledInvocation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl StageScheduler for LocalScheduler {
    async fn schedule(&self, invocation: StageInvocation, delay: Duration) -> anyhow::Result<()> {
        tracing::debug!(
            stage = invocation.stage_name(),
            video_id = invocation.video_id(),
            delay_secs = delay.as_secs(),
            "scheduling stage"
        );
        self.tx
            .send(ScheduledInvocation { invocation, delay })
            .map_err(|e| anyhow::anyhow!("scheduler channel closed: {e}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invocation_wire_format() {
        let invocation = StageInvocation::PollTranscription {
            video_id: "vid".into(),
            job_name: "transcribe-vid".into(),
            attempt: 3,
        };
        let value = serde_json::to_value(&invocation).expect("serialize");
        assert_eq!(value["op"], "poll_transcription");
        assert_eq!(value["attempt"], 3);

        let parsed: StageInvocation = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, invocation);
    }

    #[test]
    fn test_malformed_invocations_rejected() {
        let unknown_op = serde_json::json!({ "op": "reticulate_splines", "video_id": "vid" });
        assert!(serde_json::from_value::<StageInvocation>(unknown_op).is_err());

        let missing_field = serde_json::json!({ "op": "poll_transcription", "video_id": "vid" });
        assert!(serde_json::from_value::<StageInvocation>(missing_field).is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_local_scheduler_preserves_order_and_delay() {
        let (scheduler, mut rx) = LocalScheduler::new();
        scheduler
            .schedule(
                StageInvocation::ExtractFrames { video_id: "a".into() },
                Duration::ZERO,
            )
            .await
            .expect("schedule");
        scheduler
            .schedule(
                StageInvocation::PollTranscription {
                    video_id: "a".into(),
                    job_name: "j".into(),
                    attempt: 1,
                },
                Duration::from_secs(30),
            )
            .await
            .expect("schedule");

        let first = rx.recv().await.expect("first");
        assert_eq!(first.invocation.stage_name(), "extract_frames");
        assert_eq!(first.delay, Duration::ZERO);
        let second = rx.recv().await.expect("second");
        assert_eq!(second.delay, Duration::from_secs(30));
    }
}
