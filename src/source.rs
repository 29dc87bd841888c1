//! Input classification and platform resolution.
//!
//! Classifies the CLI input as a local file or a remote URL, and maps the
//! URL's domain to one of the supported video platforms.

use crate::error::{Result, VidmarkError};
use std::path::PathBuf;
use url::Url;

/// Where the video comes from. Every pipeline run resolves to exactly one
/// local file before any downstream stage sees it.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// A file already on disk.
    Local(PathBuf),
    /// A URL on a supported hosting platform.
    Remote(Url),
}

impl VideoSource {
    /// Classify raw CLI input as a local path or a remote URL.
    ///
    /// Anything that parses as an http(s) URL with a host is remote;
    /// everything else is treated as a filesystem path.
    pub fn parse(input: &str) -> Self {
        if let Ok(url) = Url::parse(input.trim()) {
            if (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some() {
                return VideoSource::Remote(url);
            }
        }
        VideoSource::Local(PathBuf::from(input))
    }
}

/// Supported hosting platforms, resolved from a URL's domain.
///
/// The set is deliberately closed: an unknown domain is a hard error rather
/// than a hand-off to a generic downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// YouTube-like: the preferred format is a coarse quality class.
    Youtube,
    /// Bilibili-like: the preferred format is an exact format id.
    Bilibili,
}

/// Domain fragments mapped to platforms. Matched by substring against the
/// normalized host, so subdomains like `m.youtube.com` resolve too.
const SUPPORTED_DOMAINS: &[(&str, Platform)] = &[
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("bilibili.com", Platform::Bilibili),
];

impl Platform {
    /// Resolve the platform for a URL, or fail with `UnsupportedPlatform`.
    pub fn resolve(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| VidmarkError::InvalidInput(format!("URL has no host: {}", url)))?;
        let domain = host.strip_prefix("www.").unwrap_or(host);

        for (fragment, platform) in SUPPORTED_DOMAINS {
            if domain.contains(fragment) {
                return Ok(*platform);
            }
        }

        Err(VidmarkError::UnsupportedPlatform(domain.to_string()))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Youtube => write!(f, "youtube"),
            Platform::Bilibili => write!(f, "bilibili"),
        }
    }
}
