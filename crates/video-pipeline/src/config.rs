use std::time::Duration;

/// Per-item cost constants for the running estimate kept on each video
/// record. These are approximations of what the managed services charge;
/// they exist for cost control, not billing.
#[derive(Clone, Debug)]
pub struct CostModel {
    /// Transcription price per audio minute.
    pub transcription_per_minute: f64,
    /// Assumed audio bitrate when estimating duration from file size.
    pub audio_bitrate_kbps: f64,
    pub per_caption: f64,
    pub per_text_embedding: f64,
    pub per_image_embedding: f64,
    /// Flat storage cost per frame-extraction run.
    pub frame_storage_flat: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            transcription_per_minute: 0.024,
            audio_bitrate_kbps: 128.0,
            per_caption: 0.006,
            per_text_embedding: 0.0001,
            per_image_embedding: 0.00006,
            frame_storage_flat: 0.001,
        }
    }
}

impl CostModel {
    /// Estimate transcription cost from raw file size at the assumed bitrate.
    pub fn estimate_transcription(&self, size_bytes: u64) -> f64 {
        let bytes_per_second = self.audio_bitrate_kbps * 1000.0 / 8.0;
        let duration_minutes = size_bytes as f64 / bytes_per_second / 60.0;
        duration_minutes * self.transcription_per_minute
    }

    /// Frame extraction cost includes the downstream captioning and
    /// embedding that each extracted frame will incur.
    pub fn estimate_frame_extraction(&self, frame_count: usize) -> f64 {
        self.frame_storage_flat
            + frame_count as f64 * (self.per_caption + self.per_image_embedding)
    }
}

/// All pipeline tunables. Defaults match the deployed configuration; every
/// value can be overridden from the environment via [`PipelineConfig::from_env`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Nominal chunk window length for the speech index.
    pub chunk_duration_secs: f64,
    /// Overlap between consecutive chunk windows.
    pub chunk_overlap_secs: f64,
    /// Target frame count; sampling spreads exactly this many frames evenly
    /// across the video regardless of its length.
    pub max_frames_per_video: u32,
    /// JPEG quality for extracted frames, 1..=100.
    pub frame_quality: u8,
    pub caption_prompt: String,
    pub language_code: String,
    /// Speaker diarization cap passed to the transcription oracle.
    pub max_speaker_labels: Option<u32>,
    /// Delay between transcription poll attempts.
    pub poll_interval: Duration,
    /// Poll ceiling; together with `poll_interval` this bounds the maximum
    /// wait (default 60 x 30s = 30 minutes).
    pub max_poll_attempts: u32,
    /// Hard cap on `top_k` accepted by the search adapters.
    pub search_top_k_cap: usize,
    pub cost: CostModel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: 10.0,
            chunk_overlap_secs: 1.0,
            max_frames_per_video: 45,
            frame_quality: 85,
            caption_prompt: "Describe what is happening in the image".to_string(),
            language_code: "en-US".to_string(),
            max_speaker_labels: Some(5),
            poll_interval: Duration::from_secs(30),
            max_poll_attempts: 60,
            search_top_k_cap: 20,
            cost: CostModel::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `VIDBASE_*` environment variables. Unparsable
    /// values fall back to the default with a warning rather than aborting
    /// startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(v) = env_parse::<f64>("VIDBASE_CHUNK_DURATION_SECONDS") {
            config.chunk_duration_secs = v;
        }
        if let Some(v) = env_parse::<f64>("VIDBASE_CHUNK_OVERLAP_SECONDS") {
            config.chunk_overlap_secs = v;
        }
        if let Some(v) = env_parse::<u32>("VIDBASE_MAX_FRAMES_PER_VIDEO") {
            config.max_frames_per_video = v;
        }
        if let Some(v) = env_parse::<u8>("VIDBASE_FRAME_QUALITY") {
            config.frame_quality = v;
        }
        if let Ok(v) = std::env::var("VIDBASE_LANGUAGE_CODE") {
            config.language_code = v;
        }
        if let Some(v) = env_parse::<u64>("VIDBASE_POLL_INTERVAL_SECONDS") {
            config.poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u32>("VIDBASE_MAX_POLL_ATTEMPTS") {
            config.max_poll_attempts = v;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "unparsable env override, using default");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transcription_estimate() {
        let cost = CostModel::default();
        // 10 minutes of 128 kbps audio = 9_600_000 bytes
        let estimate = cost.estimate_transcription(9_600_000);
        assert!((estimate - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_poll_ceiling_default_is_30_minutes() {
        let config = PipelineConfig::default();
        let ceiling = config.poll_interval * config.max_poll_attempts;
        assert_eq!(ceiling, Duration::from_secs(30 * 60));
    }
}
