use async_trait::async_trait;
use bytes::Bytes;

/// External vision-language model that describes a single frame.
#[async_trait]
pub trait VisionCaptioner: Send + Sync {
    async fn caption(&self, image: Bytes, prompt: &str) -> anyhow::Result<String>;
}

/// External text embedding model (speech and caption indexes).
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// External multimodal embedding model (image index). Text queries embed into
/// the same space as frame images, which is what makes text-to-image search
/// work at query time.
#[async_trait]
pub trait MultiModalEmbedder: Send + Sync {
    async fn embed_image(&self, image: Bytes) -> anyhow::Result<Vec<f32>>;

    async fn embed_query_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}
