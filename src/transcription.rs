//! Speech-to-text transcription against a whisper server.

use crate::config::WhisperSettings;
use crate::error::{Result, VidmarkError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for transcription requests (10 minutes; whisper can be
/// slow on long audio).
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Transcription collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a WAV file to plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Transcriber talking to a whisper.cpp-style inference server over HTTP.
///
/// The server takes a multipart upload (`file` plus decoding parameters) and
/// answers with a JSON body carrying a `text` field.
pub struct WhisperServerTranscriber {
    client: reqwest::Client,
    server_url: String,
    temperature: f32,
    temperature_inc: f32,
}

impl WhisperServerTranscriber {
    pub fn new(settings: &WhisperSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            server_url: settings.server_url.clone(),
            temperature: settings.temperature,
            temperature_inc: settings.temperature_inc,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperServerTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        debug!("Uploading audio to whisper server at {}", self.server_url);

        let file_bytes = tokio::fs::read(audio_path).await?;

        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("temperature", self.temperature.to_string())
            .text("temperature_inc", self.temperature_inc.to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.server_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VidmarkError::Transcription(format!("whisper server unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VidmarkError::Transcription(format!(
                "whisper server returned {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VidmarkError::Transcription(format!("invalid whisper response: {e}")))?;

        let text = body
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                VidmarkError::Transcription("whisper response has no 'text' field".into())
            })?;

        debug!("Transcribed {} characters", text.len());
        Ok(text.trim().to_string())
    }
}
