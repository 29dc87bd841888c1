//! Vidmark - Video to Markdown
//!
//! A CLI tool that turns a video (local file or a supported hosting URL) into
//! a Markdown document containing a refined transcript interleaved with
//! key-frame images.
//!
//! # Overview
//!
//! Vidmark allows you to:
//! - Download a video from a supported platform (YouTube, Bilibili) or use a local file
//! - Extract and transcribe its audio through a whisper server
//! - Sample representative key frames at uniform intervals
//! - Refine the transcript with an OpenAI-compatible chat endpoint
//! - Assemble everything into a single Markdown note
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `source` - Input classification and platform resolution
//! - `download` - Format catalog and video acquisition strategy
//! - `identity` - Content-addressed artifact naming
//! - `audio` - Audio extraction
//! - `transcription` - Speech-to-text transcription
//! - `refine` - Transcript refinement
//! - `frames` - Key-frame sampling
//! - `document` - Markdown assembly
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidmark::config::Settings;
//! use vidmark::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator.process_video("https://youtu.be/dQw4w9WgXcQ", false).await?;
//!     println!("Markdown written to {}", outcome.markdown_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod document;
pub mod download;
pub mod error;
pub mod frames;
pub mod identity;
pub mod orchestrator;
pub mod refine;
pub mod source;
pub mod transcription;

pub use error::{Result, VidmarkError};
