//! Pipeline orchestrator for Vidmark.
//!
//! Runs the stages strictly in order, each consuming the previous stage's
//! output: resolve -> identify -> extract audio -> transcribe -> sample key
//! frames -> refine -> assemble. Every stage failure is fatal except
//! refinement, which degrades to the raw transcript. Artifacts from a failed
//! run are left in place for inspection.

use crate::audio::{AudioExtractor, FfmpegAudioExtractor};
use crate::config::Settings;
use crate::document::{self, FrameRef};
use crate::download::{acquire, DownloadBackend, YtDlpBackend};
use crate::error::{Result, VidmarkError};
use crate::frames::{FfmpegFrameSampler, FrameSampler};
use crate::identity::{ArtifactPaths, VideoIdentity};
use crate::refine::{ChatRefiner, Refiner};
use crate::source::VideoSource;
use crate::transcription::{Transcriber, WhisperServerTranscriber};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Vidmark pipeline.
pub struct Orchestrator {
    settings: Settings,
    backend: Arc<dyn DownloadBackend>,
    audio_extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    refiner: Arc<dyn Refiner>,
    frame_sampler: Arc<dyn FrameSampler>,
}

impl Orchestrator {
    /// Create a new orchestrator with the real collaborators.
    pub fn new(settings: Settings) -> Result<Self> {
        let audio_extractor = Arc::new(FfmpegAudioExtractor::new(
            settings.audio.sample_rate,
            &settings.audio.codec,
        ));
        let transcriber = Arc::new(WhisperServerTranscriber::new(&settings.whisper));
        let refiner = Arc::new(ChatRefiner::new(&settings.refine));
        let frame_sampler = Arc::new(FfmpegFrameSampler::new(settings.frames.jpeg_quality));

        Ok(Self {
            settings,
            backend: Arc::new(YtDlpBackend),
            audio_extractor,
            transcriber,
            refiner,
            frame_sampler,
        })
    }

    /// Create an orchestrator with custom collaborators.
    pub fn with_components(
        settings: Settings,
        backend: Arc<dyn DownloadBackend>,
        audio_extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        refiner: Arc<dyn Refiner>,
        frame_sampler: Arc<dyn FrameSampler>,
    ) -> Self {
        Self {
            settings,
            backend,
            audio_extractor,
            transcriber,
            refiner,
            frame_sampler,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process a video: acquire, transcribe, sample key frames, refine, and
    /// assemble the Markdown document.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn process_video(&self, input: &str, force: bool) -> Result<PipelineOutcome> {
        // Stage 1: resolve the input to exactly one local file.
        let video_path = match VideoSource::parse(input) {
            VideoSource::Local(path) => path,
            VideoSource::Remote(url) => {
                info!("Acquiring video from {}", url);
                eprintln!("  Downloading video...");
                acquire(
                    self.backend.as_ref(),
                    &url,
                    &self.settings.download,
                    &self.settings.video_dir(),
                )
                .await?
            }
        };

        if !video_path.exists() {
            return Err(VidmarkError::SourceNotFound(
                video_path.display().to_string(),
            ));
        }

        // Stage 2: identify the content and derive all artifact paths.
        let identity = VideoIdentity::of_file(&video_path)?;
        info!("Video identity: {}-{}", identity.date, identity.content_hash);

        let paths = ArtifactPaths::new(&identity, &self.settings.audio_dir(), &self.settings.doc_dir());
        std::fs::create_dir_all(&self.settings.audio_dir())?;
        std::fs::create_dir_all(&self.settings.doc_dir())?;
        std::fs::create_dir_all(&paths.frame_dir)?;

        // Stage 3: extract audio (fatal on failure, nothing downstream works
        // without it).
        if !force && paths.audio.exists() {
            info!("Reusing existing audio file");
        } else {
            eprintln!("  Extracting audio...");
            self.audio_extractor.extract(&video_path, &paths.audio).await?;
        }

        // Stage 4: transcribe, persisting the raw text immediately so a
        // later-stage failure cannot lose it.
        let transcript = if !force && paths.transcript.exists() {
            info!("Reusing existing transcript");
            std::fs::read_to_string(&paths.transcript)?
        } else {
            eprintln!("  Transcribing...");
            let text = self.transcriber.transcribe(&paths.audio).await?;
            document::save_text(&text, &paths.transcript)?;
            text
        };

        // Stage 5: sample key frames and persist them 1-indexed.
        eprintln!("  Sampling key frames...");
        let frames = self
            .frame_sampler
            .sample(&video_path, self.settings.frames.max_frames)
            .await?;

        let markdown_dir = paths
            .markdown
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut frame_refs = Vec::with_capacity(frames.len());
        for (idx, frame) in frames.iter().enumerate() {
            let image_path = paths.frame_image(idx + 1);
            frame.image.save(&image_path)?;
            frame_refs.push(FrameRef {
                rel_path: document::relative_to(&image_path, &markdown_dir),
                timestamp_seconds: frame.timestamp_seconds,
            });
        }
        info!("Persisted {} key frames", frame_refs.len());

        // Stage 6: refine (optional; any failure degrades to the raw text).
        let (body, refined) = if self.settings.refine.enabled {
            eprintln!("  Refining transcript...");
            match self.refiner.refine(&transcript).await {
                Ok(text) => (text, true),
                Err(e) => {
                    warn!("Refinement failed, keeping the raw transcript: {}", e);
                    eprintln!("  Refinement failed, keeping the raw transcript.");
                    (transcript.clone(), false)
                }
            }
        } else {
            (transcript.clone(), false)
        };

        // Stage 7: assemble the final document.
        let markdown = document::render_markdown(&body, &frame_refs);
        document::save_text(&markdown, &paths.markdown)?;

        Ok(PipelineOutcome {
            markdown_path: paths.markdown,
            transcript_path: paths.transcript,
            frames_written: frame_refs.len(),
            refined,
        })
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Path of the assembled Markdown document.
    pub markdown_path: PathBuf,
    /// Path of the persisted raw transcript.
    pub transcript_path: PathBuf,
    /// Number of key-frame images written.
    pub frames_written: usize,
    /// Whether the body went through the refinement stage successfully.
    pub refined: bool,
}
