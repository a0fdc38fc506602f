use storage::StorageResult;
use thiserror::Error;
use video_metadata::MetadataError;

pub type StageResult<T> = std::result::Result<T, StageError>;

/// Stage failure taxonomy. The variant decides both what the caller sees and
/// whether the failure is recorded on the video's metadata record:
/// `InvalidInput` mutates nothing, `Timeout` is recorded by the poller
/// itself, everything else moves the record to the terminal error status.
#[derive(Error, Debug)]
pub enum StageError {
    /// Malformed or missing request data. No retry, no state mutation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A whole-stage precondition does not hold (no transcript, no frames,
    /// unknown duration). Fatal for the stage.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// An external collaborator failed for the stage as a whole. Per-item
    /// collaborator failures are skipped, not raised.
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// The transcription poller hit its attempt ceiling. Distinct from
    /// `Upstream` so callers can offer "retry" rather than "investigate".
    #[error("transcription timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StageError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        StageError::Upstream(err.to_string())
    }

    /// Whether the failure should be written to the video record's
    /// status/error fields by the stage guard.
    pub fn records_error_status(&self) -> bool {
        !matches!(self, StageError::InvalidInput(_) | StageError::Timeout { .. })
    }
}

/// Map a missing object to a stage precondition, leaving other storage
/// failures as-is.
pub fn required_object<T>(result: StorageResult<T>, what: &str) -> StageResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(storage::StorageError::NotFound(key)) => Err(StageError::Precondition(format!(
            "{what} not found: {key}"
        ))),
        Err(e) => Err(StageError::Storage(e)),
    }
}
