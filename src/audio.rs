//! Audio extraction.
//!
//! Normalizes a video's audio track to a WAV file at a fixed sample rate and
//! codec (16 kHz PCM by default, what the whisper server expects) by
//! shelling out to ffmpeg.

use crate::error::{Result, VidmarkError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Audio extraction collaborator. Any failure here is fatal for the run.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract the audio track of `video` into a WAV file at `wav_out`.
    async fn extract(&self, video: &Path, wav_out: &Path) -> Result<()>;
}

/// Extractor backed by the ffmpeg CLI.
pub struct FfmpegAudioExtractor {
    sample_rate: u32,
    codec: String,
}

impl FfmpegAudioExtractor {
    pub fn new(sample_rate: u32, codec: &str) -> Self {
        Self {
            sample_rate,
            codec: codec.to_string(),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn extract(&self, video: &Path, wav_out: &Path) -> Result<()> {
        debug!("Extracting audio at {} Hz ({})", self.sample_rate, self.codec);

        let result = Command::new("ffmpeg")
            .arg("-i").arg(video)
            .arg("-vn")
            .arg("-ar").arg(self.sample_rate.to_string())
            .arg("-acodec").arg(&self.codec)
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(wav_out)
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
                return Err(VidmarkError::AudioExtraction(format!("ffmpeg error: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmarkError::AudioExtraction(format!(
                "ffmpeg failed: {stderr}"
            )));
        }

        if !wav_out.exists() {
            return Err(VidmarkError::AudioExtraction(
                "ffmpeg succeeded but produced no audio file".into(),
            ));
        }

        Ok(())
    }
}
