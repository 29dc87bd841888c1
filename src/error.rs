//! Error types for Vidmark.

use thiserror::Error;

/// Library-level error type for Vidmark operations.
#[derive(Error, Debug)]
pub enum VidmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported video platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Format catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("No usable video format: {0}")]
    FormatUnavailable(String),

    #[error("Video download failed: {0}")]
    DownloadFailed(String),

    #[error("Video source not found: {0}")]
    SourceNotFound(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcript refinement failed: {0}")]
    Refinement(String),

    #[error("Key-frame sampling failed: {0}")]
    FrameSampling(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for Vidmark operations.
pub type Result<T> = std::result::Result<T, VidmarkError>;
