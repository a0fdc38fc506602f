//! Interfaces for the managed services the pipeline drives. This crate
//! defines the seams only; model internals, wire formats and index search
//! algorithms all live on the other side of these traits.

mod media;
mod transcription;
mod vector_index;
mod vision;

pub use media::FrameSource;
pub use transcription::{TranscriptionJobStatus, TranscriptionOracle, TranscriptionRequest};
pub use vector_index::{VectorHit, VectorIndex, VectorPoint};
pub use vision::{MultiModalEmbedder, TextEmbedder, VisionCaptioner};
