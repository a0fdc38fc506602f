//! Deterministic object-store layout for a video's raw and derived artifacts.
//!
//! These keys are a compatibility contract: search indexes and external
//! consumers resolve documents by reconstructing them from `video_id` and an
//! item index, so the formats here must not change.

/// Key builders scoped to one video.
pub struct VideoPaths;

impl VideoPaths {
    /// Raw uploaded video in the videos bucket.
    pub fn raw_video(video_id: &str) -> String {
        format!("{video_id}.mp4")
    }

    /// Prefix holding every derived artifact for the video.
    pub fn processed_prefix(video_id: &str) -> String {
        format!("{video_id}/")
    }

    pub fn transcript(video_id: &str) -> String {
        format!("{video_id}/transcript.json")
    }

    pub fn frames_prefix(video_id: &str) -> String {
        format!("{video_id}/frames")
    }

    /// Frame images are 1-based: `frame_0001.jpg` is the frame at t=0.
    pub fn frame(video_id: &str, frame_number: u32) -> String {
        format!("{video_id}/frames/frame_{frame_number:04}.jpg")
    }

    pub fn speech_index_prefix(video_id: &str) -> String {
        format!("{video_id}/speech_index")
    }

    /// Speech chunk documents are 0-based, matching `chunk_index`.
    pub fn speech_chunk(video_id: &str, chunk_index: u32) -> String {
        format!("{video_id}/speech_index/chunk_{chunk_index:04}.json")
    }

    pub fn caption_index_prefix(video_id: &str) -> String {
        format!("{video_id}/caption_index")
    }

    pub fn caption(video_id: &str, frame_number: u32) -> String {
        format!("{video_id}/caption_index/frame_{frame_number:04}.json")
    }

    pub fn image_index_prefix(video_id: &str) -> String {
        format!("{video_id}/image_embeddings")
    }

    pub fn image_embedding(video_id: &str, frame_number: u32) -> String {
        format!("{video_id}/image_embeddings/frame_{frame_number:04}.json")
    }

    /// Parse the 1-based frame number out of a frame key or filename.
    pub fn frame_number(key: &str) -> Option<u32> {
        let file_name = key.rsplit('/').next()?;
        let digits = file_name
            .strip_prefix("frame_")?
            .strip_suffix(".jpg")
            .or_else(|| file_name.strip_prefix("frame_")?.strip_suffix(".json"))?;
        digits.parse().ok()
    }
}

#[cfg(test)]
mod test {
    use super::VideoPaths;

    #[test]
    fn test_layout_contract() {
        assert_eq!(VideoPaths::raw_video("vid"), "vid.mp4");
        assert_eq!(VideoPaths::transcript("vid"), "vid/transcript.json");
        assert_eq!(VideoPaths::frame("vid", 1), "vid/frames/frame_0001.jpg");
        assert_eq!(
            VideoPaths::speech_chunk("vid", 0),
            "vid/speech_index/chunk_0000.json"
        );
        assert_eq!(
            VideoPaths::caption("vid", 12),
            "vid/caption_index/frame_0012.json"
        );
        assert_eq!(
            VideoPaths::image_embedding("vid", 45),
            "vid/image_embeddings/frame_0045.json"
        );
    }

    #[test]
    fn test_frame_number_parse() {
        assert_eq!(
            VideoPaths::frame_number("vid/frames/frame_0023.jpg"),
            Some(23)
        );
        assert_eq!(VideoPaths::frame_number("frame_0001.jpg"), Some(1));
        assert_eq!(
            VideoPaths::frame_number("vid/caption_index/frame_0002.json"),
            Some(2)
        );
        assert_eq!(VideoPaths::frame_number("vid/thumbnail.jpg"), None);
    }
}
