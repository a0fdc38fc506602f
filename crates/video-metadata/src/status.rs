use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Pipeline status for one video. Ordered and forward-only: a stage may only
/// move a record to a higher-ranked status, except the terminal `Error` which
/// is reachable from any non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VideoStatus {
    Uploaded,
    Transcribing,
    ExtractingFrames,
    CaptionsReady,
    SpeechIndexReady,
    ImageIndexReady,
    Ready,
    Error,
}

impl VideoStatus {
    pub fn rank(&self) -> u8 {
        match self {
            VideoStatus::Uploaded => 0,
            VideoStatus::Transcribing => 1,
            VideoStatus::ExtractingFrames => 2,
            VideoStatus::CaptionsReady => 3,
            VideoStatus::SpeechIndexReady => 4,
            VideoStatus::ImageIndexReady => 5,
            VideoStatus::Ready => 6,
            // terminal, never compared forward
            VideoStatus::Error => u8::MAX,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::Error)
    }

    /// Whether a `start_pipeline` call should be skipped for cost control.
    /// `Uploaded` has not started paid work yet and `Error` may be retried
    /// after investigation; everything else is in flight or done.
    pub fn blocks_reprocessing(&self) -> bool {
        !matches!(self, VideoStatus::Uploaded | VideoStatus::Error)
    }

    /// Forward-only transition check: into `Error` always, otherwise strictly
    /// increasing rank.
    pub fn can_advance_to(&self, next: VideoStatus) -> bool {
        if next == VideoStatus::Error {
            return !self.is_terminal() || *self == VideoStatus::Error;
        }
        next.rank() > self.rank()
    }
}

/// Transcription branch sub-status, owned exclusively by the transcription
/// poller. Kept disjoint from [`VideoStatus`] so the frame-extraction branch
/// can race the poller without clobbering it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TranscriptionStatus {
    Pending,
    Completed,
    Failed,
    /// Distinguished from `Failed` so callers can offer "retry" instead of
    /// "investigate".
    Timeout,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_forward_only_ordering() {
        assert!(VideoStatus::Uploaded.can_advance_to(VideoStatus::Transcribing));
        assert!(VideoStatus::Transcribing.can_advance_to(VideoStatus::SpeechIndexReady));
        assert!(!VideoStatus::Ready.can_advance_to(VideoStatus::Transcribing));
        assert!(!VideoStatus::CaptionsReady.can_advance_to(VideoStatus::ExtractingFrames));
        assert!(VideoStatus::Transcribing.can_advance_to(VideoStatus::Error));
    }

    #[test]
    fn test_reprocessing_guard() {
        assert!(!VideoStatus::Uploaded.blocks_reprocessing());
        assert!(!VideoStatus::Error.blocks_reprocessing());
        assert!(VideoStatus::Transcribing.blocks_reprocessing());
        assert!(VideoStatus::Ready.blocks_reprocessing());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(VideoStatus::ExtractingFrames.to_string(), "extracting_frames");
        assert_eq!(VideoStatus::SpeechIndexReady.to_string(), "speech_index_ready");
        assert_eq!(TranscriptionStatus::Timeout.to_string(), "timeout");
    }
}
