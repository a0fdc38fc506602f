use crate::chunking::TranscriptChunker;
use crate::docs::{chunk_doc_id, IndexDocument, SpeechChunkDocument};
use crate::error::{required_object, StageError, StageResult};
use crate::transcript::TranscriptDocument;
use crate::Pipeline;
use chrono::Utc;
use inference::VectorPoint;
use storage::VideoPaths;
use video_metadata::{VideoPatch, VideoStatus};

#[derive(Clone, Debug)]
pub struct SpeechIndexReport {
    pub chunk_count: u32,
    pub total_words: u32,
}

impl Pipeline {
    /// Build the speech index from the finished transcript: window the words
    /// into overlapping chunks, embed each chunk's text and upsert the
    /// vectors, persisting one chunk document per chunk alongside.
    pub async fn build_speech_index(&self, video_id: &str) -> StageResult<SpeechIndexReport> {
        let record = self
            .metadata
            .get(video_id)
            .await?
            .ok_or_else(|| StageError::Precondition(format!("no record for video {video_id}")))?;

        let transcript_key = record
            .transcript_key
            .unwrap_or_else(|| VideoPaths::transcript(video_id));
        let raw = required_object(
            self.storage.read_to_string(&transcript_key).await,
            "transcript",
        )?;
        let transcript = TranscriptDocument::parse(&raw)?;
        let words = transcript.words();
        if words.is_empty() {
            // nothing to index is a failed stage, not an empty success
            return Err(StageError::Precondition(format!(
                "transcript for video {video_id} contains no words"
            )));
        }

        let chunks = TranscriptChunker::new(
            &words,
            self.config.chunk_duration_secs,
            self.config.chunk_overlap_secs,
        )?
        .collect::<Vec<_>>();
        tracing::info!(
            video_id,
            words = words.len(),
            chunks = chunks.len(),
            "chunked transcript"
        );

        let mut points = Vec::with_capacity(chunks.len());
        let mut embedded = 0u32;
        for chunk in &chunks {
            let vector = match self.inference.text_embedder.embed_text(&chunk.text).await {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::warn!(
                        video_id,
                        chunk_index = chunk.chunk_index,
                        error = %e,
                        "chunk embedding failed, skipping"
                    );
                    continue;
                }
            };

            let chunk_id = chunk_doc_id(video_id, chunk.chunk_index);
            let doc = SpeechChunkDocument {
                video_id: video_id.to_string(),
                chunk_id: chunk_id.clone(),
                chunk_index: chunk.chunk_index,
                text: chunk.text.clone(),
                start_time_sec: chunk.start_time_sec,
                end_time_sec: chunk.end_time_sec,
                duration_sec: chunk.duration_sec(),
                word_count: chunk.word_count,
                generated_at: Utc::now(),
            };
            self.storage
                .put(
                    &VideoPaths::speech_chunk(video_id, chunk.chunk_index),
                    serde_json::to_vec(&IndexDocument::Speech(doc))?,
                )
                .await?;

            points.push(VectorPoint {
                id: chunk_id,
                vector,
                metadata: serde_json::json!({
                    "video_id": video_id,
                    "chunk_index": chunk.chunk_index,
                    "text": chunk.text,
                    "start_time_sec": chunk.start_time_sec,
                    "end_time_sec": chunk.end_time_sec,
                }),
            });
            embedded += 1;
        }

        if !chunks.is_empty() && embedded == 0 {
            return Err(StageError::Upstream(format!(
                "all {} chunks failed embedding",
                chunks.len()
            )));
        }
        if !points.is_empty() {
            self.indexes
                .speech
                .upsert(points)
                .await
                .map_err(StageError::upstream)?;
        }

        self.metadata
            .update(
                video_id,
                VideoPatch {
                    status: Some(VideoStatus::SpeechIndexReady),
                    chunk_count: Some(embedded),
                    total_words: Some(words.len() as u32),
                    speech_index_prefix: Some(VideoPaths::speech_index_prefix(video_id)),
                    add_cost: Some(embedded as f64 * self.config.cost.per_text_embedding),
                    ..VideoPatch::new()
                },
            )
            .await?;

        self.maybe_mark_ready(video_id).await?;

        Ok(SpeechIndexReport {
            chunk_count: embedded,
            total_words: words.len() as u32,
        })
    }
}
