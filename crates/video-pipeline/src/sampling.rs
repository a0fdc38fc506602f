use crate::error::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use storage::VideoPaths;

/// One planned still-frame extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameSample {
    /// 1-based, sequential.
    pub frame_number: u32,
    pub timestamp_sec: f64,
    pub object_store_key: String,
}

/// Even-distribution extraction plan: exactly `target` frames spread across
/// `[0, duration)` regardless of video length. Unlike fixed-interval
/// sampling this bounds downstream captioning/embedding cost by the target
/// count, not the duration.
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub duration_seconds: f64,
    /// Decode rate handed to the frame source, `target / duration`.
    pub fps: f64,
    pub samples: Vec<FrameSample>,
}

impl FramePlan {
    /// `duration` must be a known positive number; an undeterminable
    /// duration is a fatal stage precondition, never silently guessed.
    pub fn even(video_id: &str, duration: f64, target: u32) -> StageResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(StageError::Precondition(format!(
                "could not determine video duration (got {duration})"
            )));
        }

        if target <= 1 {
            return Ok(Self {
                duration_seconds: duration,
                fps: 1.0 / duration,
                samples: vec![FrameSample {
                    frame_number: 1,
                    timestamp_sec: 0.0,
                    object_store_key: VideoPaths::frame(video_id, 1),
                }],
            });
        }

        let interval = duration / target as f64;
        let samples = (1..=target)
            .map(|frame_number| FrameSample {
                frame_number,
                timestamp_sec: (frame_number - 1) as f64 * interval,
                object_store_key: VideoPaths::frame(video_id, frame_number),
            })
            .collect();

        Ok(Self {
            duration_seconds: duration,
            fps: target as f64 / duration,
            samples,
        })
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp_sec).collect()
    }
}

/// Timestamp of an already-extracted frame under even distribution:
/// `(frame_number - 1) * duration / total_frames`, frame 1 at t=0.
pub fn frame_timestamp(frame_number: u32, total_frames: usize, duration: f64) -> f64 {
    if total_frames <= 1 {
        return 0.0;
    }
    let interval = duration / total_frames as f64;
    (frame_number.saturating_sub(1)) as f64 * interval
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_even_distribution_formula() {
        let plan = FramePlan::even("vid", 123.4, 45).expect("plan");
        assert_eq!(plan.samples.len(), 45);
        assert_eq!(plan.samples[0].frame_number, 1);
        assert_eq!(plan.samples[0].timestamp_sec, 0.0);
        // frame 45's timestamp = 44 * 123.4/45 = 120.6578
        let last = plan.samples.last().expect("samples");
        assert!((last.timestamp_sec - 44.0 * 123.4 / 45.0).abs() < 1e-9);
        assert!((plan.fps - 45.0 / 123.4).abs() < 1e-12);
    }

    #[test]
    fn test_every_timestamp_within_duration() {
        let plan = FramePlan::even("vid", 30.0, 45).expect("plan");
        assert_eq!(plan.samples.len(), 45);
        for (k, sample) in plan.samples.iter().enumerate() {
            assert_eq!(sample.frame_number, k as u32 + 1);
            assert!((sample.timestamp_sec - k as f64 * 30.0 / 45.0).abs() < 1e-9);
            assert!(sample.timestamp_sec < 30.0);
        }
    }

    #[test]
    fn test_degenerate_target_yields_single_frame() {
        for target in [0, 1] {
            let plan = FramePlan::even("vid", 42.0, target).expect("plan");
            assert_eq!(plan.samples.len(), 1);
            assert_eq!(plan.samples[0].timestamp_sec, 0.0);
            assert_eq!(plan.samples[0].object_store_key, "vid/frames/frame_0001.jpg");
        }
    }

    #[test]
    fn test_unknown_duration_is_fatal() {
        assert!(matches!(
            FramePlan::even("vid", 0.0, 45),
            Err(StageError::Precondition(_))
        ));
        assert!(matches!(
            FramePlan::even("vid", f64::NAN, 45),
            Err(StageError::Precondition(_))
        ));
    }

    #[test]
    fn test_frame_timestamp_helper() {
        assert_eq!(frame_timestamp(1, 45, 123.4), 0.0);
        assert!((frame_timestamp(45, 45, 123.4) - 44.0 * 123.4 / 45.0).abs() < 1e-9);
        assert_eq!(frame_timestamp(1, 1, 99.0), 0.0);
    }
}
