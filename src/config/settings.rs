//! Configuration settings for Vidmark.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub download: DownloadSettings,
    pub audio: AudioSettings,
    pub whisper: WhisperSettings,
    pub refine: RefineSettings,
    pub frames: FrameSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where downloaded videos are kept.
    pub video_dir: String,
    /// Directory where extracted audio files are kept.
    pub audio_dir: String,
    /// Directory where transcripts, Markdown files and key frames are written.
    pub doc_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            video_dir: "~/.vidmark/videos".to_string(),
            audio_dir: "~/.vidmark/audio".to_string(),
            doc_dir: "~/.vidmark/md".to_string(),
        }
    }
}

/// Video download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Preferred quality token for YouTube-like platforms (a yt-dlp format
    /// selector such as "best").
    pub youtube_quality: String,
    /// Preferred format id for Bilibili-like platforms. Must be an exact
    /// format id from the remote catalog, or "best".
    pub bilibili_format: String,
    /// Target resolution height used when falling back to an alternative
    /// format (e.g. 480 picks a 852x480 encoding).
    pub fallback_height: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            youtube_quality: "best".to_string(),
            bilibili_format: "30033".to_string(),
            fallback_height: 480,
        }
    }
}

/// Audio extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Target sample rate in Hz. Whisper expects 16 kHz input.
    pub sample_rate: u32,
    /// Target audio codec for the extracted WAV file.
    pub codec: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            codec: "pcm_s16le".to_string(),
        }
    }
}

/// Whisper server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperSettings {
    /// Inference endpoint of a running whisper server.
    pub server_url: String,
    /// Decoding temperature.
    pub temperature: f32,
    /// Temperature increment used when decoding falls back.
    pub temperature_inc: f32,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080/inference".to_string(),
            temperature: 0.0,
            temperature_inc: 0.2,
        }
    }
}

/// Transcript refinement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineSettings {
    /// Whether to refine the raw transcript at all.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Model name passed to the chat endpoint. Local servers typically
    /// ignore this, but the API requires one.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the refined output.
    pub max_tokens: u32,
    /// System role instruction.
    pub role_prompt: String,
    /// User message template. `{text}` is replaced with the raw transcript.
    pub prompt_template: String,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "http://127.0.0.1:1234/v1".to_string(),
            model: "local".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            role_prompt: "You are a professional text-editing assistant.".to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Default user prompt for transcript refinement.
const DEFAULT_PROMPT_TEMPLATE: &str = "```\n{text}\n```\n\n\
Rewrite the transcript above as well-structured Markdown:\n\n\
1. Keep the original content and preserve as much detail as possible\n\
2. You may add section headings, but no other new content\n\
3. Fix obvious transcription and grammar errors\n";

/// Key-frame sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Maximum number of key frames to sample.
    pub max_frames: u32,
    /// JPEG quality (2 is near-lossless for ffmpeg's -q:v scale).
    pub jpeg_quality: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            max_frames: 15,
            jpeg_quality: 2,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidmarkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidmark")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded video download directory.
    pub fn video_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.video_dir)
    }

    /// Get the expanded audio directory.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.audio_dir)
    }

    /// Get the expanded document directory.
    pub fn doc_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.doc_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_expected_pipeline_parameters() {
        let settings = Settings::default();

        assert_eq!(settings.audio.sample_rate, 16_000);
        assert_eq!(settings.audio.codec, "pcm_s16le");
        assert_eq!(settings.download.youtube_quality, "best");
        assert_eq!(settings.download.fallback_height, 480);
        assert!(settings.refine.enabled);
        assert!(settings.refine.prompt_template.contains("{text}"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [download]
            bilibili_format = "80"

            [frames]
            max_frames = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.download.bilibili_format, "80");
        assert_eq!(settings.frames.max_frames, 5);
        // Untouched sections keep their defaults
        assert_eq!(settings.download.youtube_quality, "best");
        assert_eq!(settings.whisper.server_url, "http://127.0.0.1:8080/inference");
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.frames.max_frames = 7;
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reloaded.frames.max_frames, 7);
    }
}
