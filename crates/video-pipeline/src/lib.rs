//! Video understanding pipeline: turns an uploaded video into three
//! searchable semantic indexes (speech, captions, images) plus a metadata
//! record tracking progress and cost.
//!
//! The pipeline is a set of re-entrant stages over shared object storage
//! and a metadata store. Stages never call each other; they hand successor
//! invocations to a [`StageScheduler`] and a worker loop drives
//! [`Pipeline::dispatch`]. All external services sit behind traits in the
//! `inference` crate, so the whole pipeline runs in-process against fakes.

mod chunking;
mod config;
mod delete;
mod docs;
mod error;
mod orchestrator;
mod poll;
mod query;
mod sampling;
mod scheduler;
mod stages;
mod tools;
mod transcript;

pub use chunking::{TranscriptChunk, TranscriptChunker};
pub use config::{CostModel, PipelineConfig};
pub use delete::DeletionSummary;
pub use docs::{
    chunk_doc_id, frame_doc_id, CaptionDocument, ImageEmbeddingDocument, IndexDocument,
    SpeechChunkDocument,
};
pub use error::{StageError, StageResult};
pub use orchestrator::StartOutcome;
pub use poll::PollOutcome;
pub use query::{FrameHit, SpeechHit};
pub use sampling::{frame_timestamp, FramePlan, FrameSample};
pub use scheduler::{LocalScheduler, ScheduledInvocation, StageInvocation, StageScheduler};
pub use stages::{FrameExtractionReport, SpeechIndexReport};
pub use tools::VideoSummary;
pub use transcript::{TranscriptDocument, TranscriptItem, WordToken, TRANSCRIPT_SCHEMA_VERSION};

use inference::{
    FrameSource, MultiModalEmbedder, TextEmbedder, TranscriptionOracle, VectorIndex,
    VisionCaptioner,
};
use std::sync::Arc;
use storage::ObjectStorage;
use video_metadata::MetadataStore;

/// The external model services the stages call out to.
#[derive(Clone)]
pub struct InferenceStack {
    pub transcription: Arc<dyn TranscriptionOracle>,
    pub frame_source: Arc<dyn FrameSource>,
    pub captioner: Arc<dyn VisionCaptioner>,
    pub text_embedder: Arc<dyn TextEmbedder>,
    pub image_embedder: Arc<dyn MultiModalEmbedder>,
}

/// The three similarity indexes. Kept separate so each modality can be
/// searched, weighted and rebuilt on its own.
#[derive(Clone)]
pub struct IndexStack {
    pub speech: Arc<dyn VectorIndex>,
    pub captions: Arc<dyn VectorIndex>,
    pub images: Arc<dyn VectorIndex>,
}

/// The pipeline itself. Cheap to clone-by-Arc at the edges; all methods take
/// `&self` and the collaborators are internally synchronized, so one
/// instance serves concurrent stage invocations.
pub struct Pipeline {
    config: PipelineConfig,
    storage: ObjectStorage,
    metadata: Arc<dyn MetadataStore>,
    inference: InferenceStack,
    indexes: IndexStack,
    scheduler: Arc<dyn StageScheduler>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        storage: ObjectStorage,
        metadata: Arc<dyn MetadataStore>,
        inference: InferenceStack,
        indexes: IndexStack,
        scheduler: Arc<dyn StageScheduler>,
    ) -> Self {
        Self {
            config,
            storage,
            metadata,
            inference,
            indexes,
            scheduler,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &ObjectStorage {
        &self.storage
    }
}
