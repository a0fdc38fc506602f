use crate::error::{StageError, StageResult};
use crate::Pipeline;
use inference::VectorHit;
use serde::Serialize;
use serde_json::Value;

/// A speech-index hit resolved to a moment in a video.
#[derive(Clone, Debug, Serialize)]
pub struct SpeechHit {
    pub video_id: String,
    pub chunk_id: String,
    pub score: f32,
    pub text: String,
    pub start_time_sec: f64,
    pub end_time_sec: f64,
}

/// A caption- or image-index hit resolved to a frame. `caption` is `None`
/// for image-index hits, which carry no text.
#[derive(Clone, Debug, Serialize)]
pub struct FrameHit {
    pub video_id: String,
    pub frame_id: String,
    pub score: f32,
    pub frame_number: u32,
    pub timestamp_sec: f64,
    pub frame_key: String,
    pub caption: Option<String>,
}

impl Pipeline {
    /// Semantic search over what was said. `video_id` narrows the search to
    /// one video when present.
    pub async fn search_speech(
        &self,
        query: &str,
        top_k: usize,
        video_id: Option<&str>,
    ) -> StageResult<Vec<SpeechHit>> {
        let top_k = self.clamp_top_k(query, top_k)?;
        let vector = self
            .inference
            .text_embedder
            .embed_text(query)
            .await
            .map_err(StageError::upstream)?;
        let hits = self
            .indexes
            .speech
            .query(vector, top_k, video_id)
            .await
            .map_err(StageError::upstream)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let m = &hit.metadata;
                Some(SpeechHit {
                    video_id: str_field(m, "video_id")?,
                    chunk_id: hit.id.clone(),
                    score: hit.score,
                    text: str_field(m, "text").unwrap_or_default(),
                    start_time_sec: f64_field(m, "start_time_sec")?,
                    end_time_sec: f64_field(m, "end_time_sec")?,
                })
            })
            .collect())
    }

    /// Semantic search over what the frames look like, described in words.
    pub async fn search_captions(
        &self,
        query: &str,
        top_k: usize,
        video_id: Option<&str>,
    ) -> StageResult<Vec<FrameHit>> {
        let top_k = self.clamp_top_k(query, top_k)?;
        let vector = self
            .inference
            .text_embedder
            .embed_text(query)
            .await
            .map_err(StageError::upstream)?;
        let hits = self
            .indexes
            .captions
            .query(vector, top_k, video_id)
            .await
            .map_err(StageError::upstream)?;
        Ok(frame_hits(hits))
    }

    /// Text-to-image search: the query embeds into the same space as the
    /// frame images, no captions involved.
    pub async fn search_images(
        &self,
        query: &str,
        top_k: usize,
        video_id: Option<&str>,
    ) -> StageResult<Vec<FrameHit>> {
        let top_k = self.clamp_top_k(query, top_k)?;
        let vector = self
            .inference
            .image_embedder
            .embed_query_text(query)
            .await
            .map_err(StageError::upstream)?;
        let hits = self
            .indexes
            .images
            .query(vector, top_k, video_id)
            .await
            .map_err(StageError::upstream)?;
        Ok(frame_hits(hits))
    }

    fn clamp_top_k(&self, query: &str, top_k: usize) -> StageResult<usize> {
        if query.trim().is_empty() {
            return Err(StageError::InvalidInput("empty search query".to_string()));
        }
        Ok(top_k.clamp(1, self.config.search_top_k_cap))
    }
}

/// Resolve raw hits to frames, dropping hits with malformed metadata.
fn frame_hits(hits: Vec<VectorHit>) -> Vec<FrameHit> {
    hits.into_iter()
        .filter_map(|hit| {
            let m = &hit.metadata;
            let resolved = FrameHit {
                video_id: str_field(m, "video_id")?,
                frame_id: hit.id.clone(),
                score: hit.score,
                frame_number: m.get("frame_number")?.as_u64()? as u32,
                timestamp_sec: f64_field(m, "timestamp_sec")?,
                frame_key: str_field(m, "frame_key")?,
                caption: str_field(m, "caption"),
            };
            Some(resolved)
        })
        .collect()
}

fn str_field(metadata: &Value, key: &str) -> Option<String> {
    Some(metadata.get(key)?.as_str()?.to_string())
}

fn f64_field(metadata: &Value, key: &str) -> Option<f64> {
    metadata.get(key)?.as_f64()
}
