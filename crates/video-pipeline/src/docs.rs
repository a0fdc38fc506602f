use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deterministic document/vector id for a speech chunk.
pub fn chunk_doc_id(video_id: &str, chunk_index: u32) -> String {
    format!("{video_id}_chunk_{chunk_index:04}")
}

/// Deterministic document/vector id for a frame-derived document.
pub fn frame_doc_id(video_id: &str, frame_number: u32) -> String {
    format!("{video_id}_frame_{frame_number:04}")
}

/// Immutable index documents, written once per stage run. Re-running a stage
/// overwrites the same keys and ids, which is what makes at-least-once
/// delivery safe.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "doc_type", rename_all = "snake_case")]
pub enum IndexDocument {
    Speech(SpeechChunkDocument),
    Caption(CaptionDocument),
    Image(ImageEmbeddingDocument),
}

/// Speech-index unit: one transcript chunk. The embedding vector lives in
/// the vector index, keyed by `chunk_id`; the document carries the text and
/// timing needed to resolve a hit back to a moment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeechChunkDocument {
    pub video_id: String,
    pub chunk_id: String,
    pub chunk_index: u32,
    pub text: String,
    pub start_time_sec: f64,
    pub end_time_sec: f64,
    pub duration_sec: f64,
    pub word_count: u32,
    pub generated_at: DateTime<Utc>,
}

/// Caption-index unit: one described frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptionDocument {
    pub video_id: String,
    pub frame_id: String,
    pub frame_number: u32,
    pub frame_timestamp_sec: f64,
    pub caption: String,
    pub frame_key: String,
    pub generated_at: DateTime<Utc>,
}

/// Image-index unit: one frame embedding. Frames are already discrete, so
/// unlike speech there is no chunking step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageEmbeddingDocument {
    pub video_id: String,
    pub frame_id: String,
    pub frame_number: u32,
    pub frame_timestamp_sec: f64,
    pub frame_key: String,
    pub embedding: Vec<f32>,
    pub embedding_dimension: usize,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deterministic_ids() {
        assert_eq!(chunk_doc_id("vid", 0), "vid_chunk_0000");
        assert_eq!(chunk_doc_id("vid", 12), "vid_chunk_0012");
        assert_eq!(frame_doc_id("vid", 45), "vid_frame_0045");
    }

    #[test]
    fn test_tagged_serialization() {
        let doc = IndexDocument::Caption(CaptionDocument {
            video_id: "vid".into(),
            frame_id: frame_doc_id("vid", 3),
            frame_number: 3,
            frame_timestamp_sec: 5.48,
            caption: "a person typing".into(),
            frame_key: "vid/frames/frame_0003.jpg".into(),
            generated_at: Utc::now(),
        });
        let value = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(value["doc_type"], "caption");
        assert_eq!(value["frame_id"], "vid_frame_0003");
        let parsed: IndexDocument = serde_json::from_value(value).expect("deserialize");
        assert!(matches!(parsed, IndexDocument::Caption(_)));
    }
}
