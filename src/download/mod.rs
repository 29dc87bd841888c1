//! Video acquisition.
//!
//! Turns a remote [`VideoSource`](crate::source::VideoSource) into a local
//! file, choosing and retrying formats as needed:
//!
//! 1. Primary attempt with the platform's configured preferred token.
//!    YouTube-like platforms use a coarse quality class and simply try it;
//!    Bilibili-like platforms use an exact format id that is validated
//!    against the catalog before any download is attempted.
//! 2. On primary failure, fall back to the catalog entry matching the
//!    configured target height (smallest known size wins among ties).
//! 3. On exhaustion, dump the full catalog so the operator can pick a
//!    working format id, then fail.
//!
//! The download primitive itself is behind the [`DownloadBackend`] trait;
//! the real implementation shells out to yt-dlp.

mod catalog;

pub use catalog::{dump_catalog, FormatDescriptor};

use crate::config::DownloadSettings;
use crate::error::{Result, VidmarkError};
use crate::source::Platform;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Download primitive: catalog fetch plus a single-format download.
///
/// Kept as a trait so the acquisition strategy can be exercised without a
/// network or a yt-dlp binary.
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    /// Fetch the remote format catalog (metadata only, no media bytes).
    async fn fetch_catalog(&self, url: &str) -> Result<Vec<FormatDescriptor>>;

    /// Download one format and return the path yt-dlp reports.
    async fn download(&self, url: &str, format_token: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Backend that shells out to yt-dlp.
pub struct YtDlpBackend;

#[async_trait]
impl DownloadBackend for YtDlpBackend {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self, url: &str) -> Result<Vec<FormatDescriptor>> {
        debug!("Fetching format catalog");

        let result = Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmarkError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(VidmarkError::CatalogUnavailable(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmarkError::CatalogUnavailable(format!(
                "yt-dlp metadata fetch failed: {stderr}"
            )));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| VidmarkError::CatalogUnavailable(format!("invalid yt-dlp output: {e}")))?;

        let formats = info
            .get("formats")
            .cloned()
            .ok_or_else(|| VidmarkError::CatalogUnavailable("no formats reported".into()))?;

        serde_json::from_value(formats)
            .map_err(|e| VidmarkError::CatalogUnavailable(format!("malformed formats array: {e}")))
    }

    #[instrument(skip(self, output_dir))]
    async fn download(&self, url: &str, format_token: &str, output_dir: &Path) -> Result<PathBuf> {
        info!("Downloading with format '{}'", format_token);

        let template = output_dir.join("%(id)s.%(ext)s");

        let result = Command::new("yt-dlp")
            .arg("-f").arg(format_token)
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--quiet")
            // yt-dlp prints the final path after any merge/move steps
            .arg("--print").arg("after_move:filepath")
            .arg("--no-simulate")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmarkError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(VidmarkError::DownloadFailed(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmarkError::DownloadFailed(format!("yt-dlp failed: {stderr}")));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| PathBuf::from(l.trim()))
            .ok_or_else(|| {
                VidmarkError::DownloadFailed("yt-dlp did not report an output path".into())
            })?;

        Ok(path)
    }
}

/// Resolve a remote URL to a local video file.
///
/// Fails with `UnsupportedPlatform`, `CatalogUnavailable`,
/// `FormatUnavailable` or `DownloadFailed`. When both the primary and the
/// fallback attempt are exhausted, the full catalog is dumped to stderr
/// before the error surfaces.
#[instrument(skip_all, fields(url = %url))]
pub async fn acquire(
    backend: &dyn DownloadBackend,
    url: &Url,
    settings: &DownloadSettings,
    video_dir: &Path,
) -> Result<PathBuf> {
    let platform = Platform::resolve(url)?;
    std::fs::create_dir_all(video_dir)?;

    // Fetched at most once per acquisition, and only when a format needs
    // validating or a fallback must be picked.
    let mut catalog: Option<Vec<FormatDescriptor>> = None;

    let primary_failure = match platform {
        Platform::Youtube => {
            // Best-effort policy: try the quality class, fall back on any failure.
            info!("Primary attempt with quality '{}'", settings.youtube_quality);
            match try_download(backend, url, &settings.youtube_quality, video_dir).await {
                Ok(path) => return Ok(path),
                Err(e) => e,
            }
        }
        Platform::Bilibili => {
            // Exact-id policy: an id missing from the catalog is a fallback
            // condition, not a download attempt.
            let token = settings.bilibili_format.as_str();
            if token == "best" {
                match try_download(backend, url, token, video_dir).await {
                    Ok(path) => return Ok(path),
                    Err(e) => e,
                }
            } else {
                let formats = fetch_cached(backend, url, &mut catalog).await?;
                if formats.iter().any(|f| f.id == token) {
                    info!("Primary attempt with format id '{}'", token);
                    match try_download(backend, url, token, video_dir).await {
                        Ok(path) => return Ok(path),
                        Err(e) => e,
                    }
                } else {
                    VidmarkError::FormatUnavailable(format!(
                        "configured format id '{}' is not offered by the platform",
                        token
                    ))
                }
            }
        }
    };

    warn!("Primary download attempt failed: {}", primary_failure);

    // Fallback by target resolution height.
    let formats = fetch_cached(backend, url, &mut catalog).await?;
    let fallback = select_fallback_format(formats, settings.fallback_height).cloned();

    let exhausted = match fallback {
        Some(format) => {
            info!(
                "Falling back to format '{}' ({}, {})",
                format.id,
                format.resolution(),
                format.size_display()
            );
            match try_download(backend, url, &format.id, video_dir).await {
                Ok(path) => return Ok(path),
                Err(e) => e,
            }
        }
        None => VidmarkError::FormatUnavailable(format!(
            "no format with height {} in the catalog",
            settings.fallback_height
        )),
    };

    // Exhaustion: show the operator what the platform actually offers so a
    // working format id can be configured.
    let formats = fetch_cached(backend, url, &mut catalog).await?;
    dump_catalog(formats);

    Err(exhausted)
}

/// Download a format and verify the file actually landed on disk.
async fn try_download(
    backend: &dyn DownloadBackend,
    url: &Url,
    format_token: &str,
    video_dir: &Path,
) -> Result<PathBuf> {
    let path = backend.download(url.as_str(), format_token, video_dir).await?;

    if !path.exists() {
        return Err(VidmarkError::DownloadFailed(format!(
            "download reported success but '{}' is missing",
            path.display()
        )));
    }

    Ok(path)
}

/// Fetch the catalog once and reuse it for the rest of the acquisition.
async fn fetch_cached<'a>(
    backend: &dyn DownloadBackend,
    url: &Url,
    cache: &'a mut Option<Vec<FormatDescriptor>>,
) -> Result<&'a [FormatDescriptor]> {
    if cache.is_none() {
        *cache = Some(backend.fetch_catalog(url.as_str()).await?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

/// Pick the fallback format for a target height.
///
/// Keeps every entry whose height exactly equals the target and chooses the
/// smallest reported byte size. Entries with unknown size are excluded
/// rather than treated as infinitely large.
pub fn select_fallback_format(
    formats: &[FormatDescriptor],
    target_height: u32,
) -> Option<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.height == Some(target_height))
        .filter_map(|f| f.filesize.map(|size| (size, f)))
        .min_by_key(|(size, _)| *size)
        .map(|(_, f)| f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn fd(id: &str, height: Option<u32>, filesize: Option<u64>) -> FormatDescriptor {
        FormatDescriptor {
            id: id.to_string(),
            ext: "mp4".to_string(),
            width: height.map(|h| h * 16 / 9),
            height,
            filesize,
            note: None,
        }
    }

    const MB: u64 = 1024 * 1024;

    /// What the stub backend should do when asked to download a token.
    #[derive(Clone, Copy)]
    enum Behavior {
        /// Create the file and return its path.
        Succeed,
        /// Return a path that was never written.
        ReportMissingFile,
        /// Fail the download outright.
        Fail,
    }

    struct StubBackend {
        catalog: Vec<FormatDescriptor>,
        behaviors: HashMap<String, Behavior>,
        download_calls: Mutex<Vec<String>>,
        catalog_fetches: AtomicUsize,
    }

    impl StubBackend {
        fn new(catalog: Vec<FormatDescriptor>, behaviors: &[(&str, Behavior)]) -> Self {
            Self {
                catalog,
                behaviors: behaviors
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
                download_calls: Mutex::new(Vec::new()),
                catalog_fetches: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.download_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DownloadBackend for StubBackend {
        async fn fetch_catalog(&self, _url: &str) -> Result<Vec<FormatDescriptor>> {
            self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.catalog.clone())
        }

        async fn download(
            &self,
            _url: &str,
            format_token: &str,
            output_dir: &Path,
        ) -> Result<PathBuf> {
            self.download_calls
                .lock()
                .unwrap()
                .push(format_token.to_string());

            let path = output_dir.join(format!("{}.mp4", format_token));
            match self.behaviors.get(format_token).copied().unwrap_or(Behavior::Fail) {
                Behavior::Succeed => {
                    std::fs::write(&path, b"video bytes")?;
                    Ok(path)
                }
                Behavior::ReportMissingFile => Ok(path),
                Behavior::Fail => Err(VidmarkError::DownloadFailed(format!(
                    "stub refused '{}'",
                    format_token
                ))),
            }
        }
    }

    fn bilibili_url() -> Url {
        Url::parse("https://www.bilibili.com/video/BV1xx411c7mD").unwrap()
    }

    fn youtube_url() -> Url {
        Url::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap()
    }

    fn settings(bilibili_format: &str) -> DownloadSettings {
        DownloadSettings {
            youtube_quality: "best".to_string(),
            bilibili_format: bilibili_format.to_string(),
            fallback_height: 480,
        }
    }

    #[test]
    fn test_fallback_prefers_smallest_known_size_at_target_height() {
        let formats = vec![
            fd("100047", Some(480), Some(50 * MB)),
            fd("30033", Some(480), Some(30 * MB)),
            fd("100048", Some(720), None),
        ];

        let chosen = select_fallback_format(&formats, 480).unwrap();
        assert_eq!(chosen.id, "30033");
    }

    #[test]
    fn test_fallback_excludes_unknown_sizes_and_other_heights() {
        let formats = vec![
            fd("a", Some(480), None),
            fd("b", Some(720), Some(10 * MB)),
            fd("c", None, Some(5 * MB)),
        ];

        assert!(select_fallback_format(&formats, 480).is_none());
        assert!(select_fallback_format(&formats, 1080).is_none());
    }

    #[tokio::test]
    async fn test_bilibili_invalid_id_never_reaches_the_downloader() {
        let backend = StubBackend::new(
            vec![
                fd("100047", Some(480), Some(50 * MB)),
                fd("30033", Some(480), Some(30 * MB)),
                fd("100048", Some(720), Some(80 * MB)),
            ],
            &[("30033", Behavior::Succeed)],
        );
        let dir = tempfile::tempdir().unwrap();

        let path = acquire(&backend, &bilibili_url(), &settings("9999"), dir.path())
            .await
            .unwrap();

        assert!(path.exists());
        // The invalid id was validated against the catalog, not downloaded.
        assert_eq!(backend.calls(), vec!["30033"]);
        // Validation, fallback selection and the invalid-id diagnostic all
        // reuse one catalog fetch.
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bilibili_valid_id_downloads_directly() {
        let backend = StubBackend::new(
            vec![fd("30033", Some(480), Some(30 * MB))],
            &[("30033", Behavior::Succeed)],
        );
        let dir = tempfile::tempdir().unwrap();

        acquire(&backend, &bilibili_url(), &settings("30033"), dir.path())
            .await
            .unwrap();

        assert_eq!(backend.calls(), vec!["30033"]);
    }

    #[tokio::test]
    async fn test_youtube_missing_file_is_a_failure_not_a_success() {
        let backend = StubBackend::new(
            vec![
                fd("137", Some(1080), Some(120 * MB)),
                fd("135", Some(480), Some(25 * MB)),
            ],
            &[
                ("best", Behavior::ReportMissingFile),
                ("135", Behavior::Succeed),
            ],
        );
        let dir = tempfile::tempdir().unwrap();

        let path = acquire(&backend, &youtube_url(), &settings("best"), dir.path())
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(backend.calls(), vec!["best", "135"]);
    }

    #[tokio::test]
    async fn test_youtube_primary_success_never_touches_the_catalog() {
        let backend = StubBackend::new(vec![], &[("best", Behavior::Succeed)]);
        let dir = tempfile::tempdir().unwrap();

        acquire(&backend, &youtube_url(), &settings("best"), dir.path())
            .await
            .unwrap();

        assert_eq!(backend.calls(), vec!["best"]);
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_when_no_format_matches_target_height() {
        let backend = StubBackend::new(
            vec![fd("100048", Some(720), Some(80 * MB))],
            &[("best", Behavior::Fail)],
        );
        let dir = tempfile::tempdir().unwrap();

        let err = acquire(&backend, &youtube_url(), &settings("best"), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, VidmarkError::FormatUnavailable(_)));
        assert_eq!(backend.calls(), vec!["best"]);
    }

    #[tokio::test]
    async fn test_exhaustion_when_fallback_download_fails() {
        let backend = StubBackend::new(
            vec![fd("135", Some(480), Some(25 * MB))],
            &[("best", Behavior::Fail), ("135", Behavior::Fail)],
        );
        let dir = tempfile::tempdir().unwrap();

        let err = acquire(&backend, &youtube_url(), &settings("best"), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, VidmarkError::DownloadFailed(_)));
        assert_eq!(backend.calls(), vec!["best", "135"]);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_fatal_before_any_network() {
        let backend = StubBackend::new(vec![], &[]);
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("https://vimeo.com/12345").unwrap();

        let err = acquire(&backend, &url, &settings("best"), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, VidmarkError::UnsupportedPlatform(_)));
        assert!(backend.calls().is_empty());
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 0);
    }
}
