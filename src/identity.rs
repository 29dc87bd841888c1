//! Content-addressed artifact naming.
//!
//! Every derived artifact (audio, transcript, key frames, Markdown) is named
//! from a [`VideoIdentity`]: the MD5 digest of the video bytes plus the
//! processing date. Re-running on the same content on the same day lands on
//! the same paths, so artifacts are reused or overwritten instead of
//! accumulating.

use crate::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Identity of a resolved local video: whole-file content hash + date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoIdentity {
    /// Lowercase hex MD5 of the file contents.
    pub content_hash: String,
    /// Processing date as `YYYYMMDD`.
    pub date: String,
}

impl VideoIdentity {
    /// Compute the identity of a video file, dated today.
    pub fn of_file(path: &Path) -> Result<Self> {
        let content_hash = hash_file(path)?;
        let date = chrono::Local::now().format("%Y%m%d").to_string();
        Ok(Self { content_hash, date })
    }

    /// Identity with an explicit date. Used by tests to pin the date.
    pub fn with_date(path: &Path, date: &str) -> Result<Self> {
        let content_hash = hash_file(path)?;
        Ok(Self {
            content_hash,
            date: date.to_string(),
        })
    }
}

/// Streaming MD5 over the file contents.
fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut context = md5::Context::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }

    Ok(format!("{:x}", context.compute()))
}

/// The on-disk layout for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Extracted audio: `{audio_dir}/{date}-{hash}.wav`
    pub audio: PathBuf,
    /// Raw transcript: `{doc_dir}/{date}-{hash}.txt`
    pub transcript: PathBuf,
    /// Final document: `{doc_dir}/{date}-{hash}.md`
    pub markdown: PathBuf,
    /// Key-frame images: `{doc_dir}/{hash}/{n}.jpg`, 1-indexed
    pub frame_dir: PathBuf,
}

impl ArtifactPaths {
    /// Derive the four artifact paths from a video identity. Pure; the
    /// orchestrator is responsible for creating parent directories.
    pub fn new(identity: &VideoIdentity, audio_dir: &Path, doc_dir: &Path) -> Self {
        let stem = format!("{}-{}", identity.date, identity.content_hash);
        Self {
            audio: audio_dir.join(format!("{}.wav", stem)),
            transcript: doc_dir.join(format!("{}.txt", stem)),
            markdown: doc_dir.join(format!("{}.md", stem)),
            frame_dir: doc_dir.join(&identity.content_hash),
        }
    }

    /// Path of the n-th key-frame image (1-indexed).
    pub fn frame_image(&self, index: usize) -> PathBuf {
        self.frame_dir.join(format!("{}.jpg", index))
    }
}
