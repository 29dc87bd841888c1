//! Key-frame sampling.
//!
//! Samples still images at uniform time intervals across the video's
//! duration: `interval = duration / (count - 1)` when more than one frame is
//! requested, so the first frame sits at the start and the last near the
//! end. Frames that fail to decode are skipped with a count shortfall.

use crate::error::{Result, VidmarkError};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// One sampled still image plus the instant it was taken from.
pub struct KeyFrame {
    /// Decoded raster image.
    pub image: image::DynamicImage,
    /// Source timestamp in seconds. Non-decreasing across a sample run.
    pub timestamp_seconds: f64,
}

/// Frame sampling collaborator.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Sample up to `max_frames` key frames from a local video.
    async fn sample(&self, video: &Path, max_frames: u32) -> Result<Vec<KeyFrame>>;
}

/// Sampler that seeks with ffmpeg and decodes the stills with the `image`
/// crate.
pub struct FfmpegFrameSampler {
    jpeg_quality: u32,
}

impl FfmpegFrameSampler {
    pub fn new(jpeg_quality: u32) -> Self {
        Self { jpeg_quality }
    }

    /// Grab a single still at `timestamp` into `dest`.
    async fn grab_still(&self, video: &Path, timestamp: f64, dest: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .arg("-ss").arg(format!("{:.3}", timestamp))
            .arg("-i").arg(video)
            .arg("-frames:v").arg("1")
            .arg("-q:v").arg(self.jpeg_quality.to_string())
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmarkError::ToolNotFound("ffmpeg".into()));
            }
            Err(e) => {
                return Err(VidmarkError::FrameSampling(format!("ffmpeg error: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmarkError::FrameSampling(format!("ffmpeg failed: {stderr}")));
        }

        Ok(())
    }
}

#[async_trait]
impl FrameSampler for FfmpegFrameSampler {
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn sample(&self, video: &Path, max_frames: u32) -> Result<Vec<KeyFrame>> {
        if max_frames == 0 {
            return Ok(Vec::new());
        }

        let duration = probe_duration(video).await?;
        info!("Sampling up to {} frames over {:.1}s", max_frames, duration);

        let timestamps = uniform_timestamps(duration, max_frames);
        let temp_dir = tempfile::tempdir()?;

        let pb = ProgressBar::new(timestamps.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Frames    [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let mut frames = Vec::with_capacity(timestamps.len());
        for (idx, &timestamp) in timestamps.iter().enumerate() {
            let still_path = temp_dir.path().join(format!("frame_{idx}.jpg"));

            if let Err(e) = self.grab_still(video, timestamp, &still_path).await {
                warn!("Skipping frame at {:.1}s: {}", timestamp, e);
                pb.inc(1);
                continue;
            }

            match image::open(&still_path) {
                Ok(img) => {
                    debug!("Decoded frame at {:.1}s", timestamp);
                    frames.push(KeyFrame {
                        image: img,
                        timestamp_seconds: timestamp,
                    });
                }
                Err(e) => {
                    warn!("Skipping undecodable frame at {:.1}s: {}", timestamp, e);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();

        if frames.is_empty() {
            return Err(VidmarkError::FrameSampling(
                "no key frame could be decoded".into(),
            ));
        }

        Ok(frames)
    }
}

/// Uniform sampling instants across `duration`. Seek targets are pulled a
/// hair back from the very end, where most containers have no frame left.
fn uniform_timestamps(duration: f64, max_frames: u32) -> Vec<f64> {
    let interval = if max_frames > 1 {
        duration / (max_frames - 1) as f64
    } else {
        duration
    };

    (0..max_frames)
        .map(|i| {
            let t = i as f64 * interval;
            t.min((duration - 0.05).max(0.0))
        })
        .collect()
}

/// Queries the duration of a media file using ffprobe with JSON output.
async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VidmarkError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(VidmarkError::FrameSampling(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(VidmarkError::FrameSampling("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| VidmarkError::FrameSampling("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| VidmarkError::FrameSampling("Could not determine video duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_timestamps_span_the_duration() {
        let ts = uniform_timestamps(10.0, 5);
        assert_eq!(ts.len(), 5);
        assert_eq!(ts[0], 0.0);
        assert_eq!(ts[1], 2.5);
        assert_eq!(ts[2], 5.0);
        assert_eq!(ts[3], 7.5);
        // Last instant is clamped just short of the end.
        assert!(ts[4] > 9.9 && ts[4] < 10.0);
    }

    #[test]
    fn test_uniform_timestamps_are_non_decreasing() {
        for count in [1u32, 2, 3, 15] {
            let ts = uniform_timestamps(37.4, count);
            assert_eq!(ts.len(), count as usize);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_single_frame_samples_the_start() {
        let ts = uniform_timestamps(10.0, 1);
        assert_eq!(ts, vec![0.0]);
    }

    #[test]
    fn test_zero_duration_does_not_go_negative() {
        let ts = uniform_timestamps(0.0, 3);
        assert!(ts.iter().all(|&t| t == 0.0));
    }
}
