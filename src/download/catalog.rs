//! Remote format catalog.
//!
//! One metadata-only yt-dlp invocation per download attempt, materialized
//! lazily by the acquisition strategy when a preferred format needs
//! validation or a fallback must be picked.

use serde::Deserialize;

/// One downloadable encoding reported by the hosting platform.
///
/// Field names follow yt-dlp's `--dump-json` output so the catalog can be
/// deserialized straight from the `formats` array, preserving the
/// platform's own ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatDescriptor {
    /// Opaque format id token, e.g. "30033" or "best".
    #[serde(rename = "format_id")]
    pub id: String,
    /// Container extension, e.g. "mp4" or "m4a".
    #[serde(default)]
    pub ext: String,
    /// Frame width in pixels. Absent for audio-only entries.
    #[serde(default)]
    pub width: Option<u32>,
    /// Frame height in pixels. Absent for audio-only entries.
    #[serde(default)]
    pub height: Option<u32>,
    /// Reported byte size, when the platform knows it.
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Human-readable note, e.g. "1080p".
    #[serde(default, rename = "format_note")]
    pub note: Option<String>,
}

impl FormatDescriptor {
    /// Resolution column as the platform would print it.
    pub fn resolution(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "audio only".to_string(),
        }
    }

    /// Byte size rendered in MB, or "N/A" when unknown.
    pub fn size_display(&self) -> String {
        match self.filesize {
            Some(bytes) => format!("{:.1}MB", bytes as f64 / 1024.0 / 1024.0),
            None => "N/A".to_string(),
        }
    }
}

/// Print the full catalog in the platform's native order.
///
/// This is the mandatory diagnostic on acquisition exhaustion: it gives the
/// operator the exact format ids to pick from for reconfiguration.
pub fn dump_catalog(formats: &[FormatDescriptor]) {
    eprintln!();
    eprintln!("Available formats:");
    eprintln!("{}", "-".repeat(80));
    eprintln!(
        "{:<10} {:<8} {:<12} {:<10} {:<20}",
        "format id", "ext", "resolution", "size", "note"
    );
    eprintln!("{}", "-".repeat(80));
    for f in formats {
        eprintln!(
            "{:<10} {:<8} {:<12} {:<10} {:<20}",
            f.id,
            f.ext,
            f.resolution(),
            f.size_display(),
            f.note.as_deref().unwrap_or(""),
        );
    }
    eprintln!("{}", "-".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_ytdlp_formats_array() {
        let json = r#"[
            {"format_id": "30216", "ext": "m4a"},
            {"format_id": "30033", "ext": "mp4", "width": 852, "height": 480,
             "filesize": 31457280, "format_note": "480P"}
        ]"#;

        let formats: Vec<FormatDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(formats.len(), 2);

        assert_eq!(formats[0].id, "30216");
        assert_eq!(formats[0].resolution(), "audio only");
        assert_eq!(formats[0].size_display(), "N/A");

        assert_eq!(formats[1].height, Some(480));
        assert_eq!(formats[1].resolution(), "852x480");
        assert_eq!(formats[1].size_display(), "30.0MB");
        assert_eq!(formats[1].note.as_deref(), Some("480P"));
    }
}
