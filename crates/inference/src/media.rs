use async_trait::async_trait;
use bytes::Bytes;

/// External media decoder (an ffmpeg-style engine). The pipeline computes the
/// sampling plan; the decoder only probes duration and materializes JPEG
/// frames at the requested timestamps.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// `None` when the container carries no usable duration, which the
    /// frame-extraction stage treats as fatal.
    async fn probe_duration(&self, video: Bytes) -> anyhow::Result<Option<f64>>;

    /// Decode one JPEG per timestamp, in order. `quality` is 1..=100.
    async fn decode_frames(
        &self,
        video: Bytes,
        timestamps: &[f64],
        quality: u8,
    ) -> anyhow::Result<Vec<Bytes>>;
}
