use crate::error::{required_object, StageError, StageResult};
use crate::sampling::FramePlan;
use crate::scheduler::StageInvocation;
use crate::Pipeline;
use std::time::Duration;
use storage::VideoPaths;
use video_metadata::{VideoPatch, VideoStatus};

#[derive(Clone, Debug)]
pub struct FrameExtractionReport {
    pub frame_count: u32,
    pub duration_seconds: f64,
    pub frames_prefix: String,
}

impl Pipeline {
    /// Extract evenly-distributed still frames from the raw video. Runs
    /// concurrently with the transcription branch and is the stage that
    /// establishes the video's duration for everything downstream.
    pub async fn extract_frames(&self, video_id: &str) -> StageResult<FrameExtractionReport> {
        let record = self
            .metadata
            .get(video_id)
            .await?
            .ok_or_else(|| StageError::Precondition(format!("no record for video {video_id}")))?;

        let raw_key = record
            .raw_key
            .unwrap_or_else(|| VideoPaths::raw_video(video_id));
        let video = required_object(self.storage.get(&raw_key).await, "raw video")?;
        let video = bytes::Bytes::from(video.to_vec());

        let duration = self
            .inference
            .frame_source
            .probe_duration(video.clone())
            .await
            .map_err(StageError::upstream)?
            .ok_or_else(|| {
                StageError::Precondition(format!("video {video_id} has no usable duration"))
            })?;

        let plan = FramePlan::even(video_id, duration, self.config.max_frames_per_video)?;
        tracing::info!(
            video_id,
            duration,
            frames = plan.samples.len(),
            fps = plan.fps,
            "extracting frames"
        );

        let images = self
            .inference
            .frame_source
            .decode_frames(video, &plan.timestamps(), self.config.frame_quality)
            .await
            .map_err(StageError::upstream)?;
        if images.len() != plan.samples.len() {
            return Err(StageError::Upstream(format!(
                "decoder returned {} frames for {} requested timestamps",
                images.len(),
                plan.samples.len()
            )));
        }

        for (sample, image) in plan.samples.iter().zip(images) {
            self.storage.put(&sample.object_store_key, image).await?;
        }

        let frame_count = plan.samples.len() as u32;
        let frames_prefix = VideoPaths::frames_prefix(video_id);
        self.metadata
            .update(
                video_id,
                VideoPatch {
                    status: Some(VideoStatus::ExtractingFrames),
                    duration_seconds: Some(duration),
                    frame_count: Some(frame_count),
                    frames_prefix: Some(frames_prefix.clone()),
                    add_cost: Some(self.config.cost.estimate_frame_extraction(frame_count as usize)),
                    ..VideoPatch::new()
                },
            )
            .await?;

        // captioning and image embedding both branch off the frames
        for invocation in [
            StageInvocation::GenerateCaptions {
                video_id: video_id.to_string(),
            },
            StageInvocation::EmbedImages {
                video_id: video_id.to_string(),
            },
        ] {
            self.schedule_next(invocation, Duration::ZERO).await;
        }

        Ok(FrameExtractionReport {
            frame_count,
            duration_seconds: duration,
            frames_prefix,
        })
    }
}
