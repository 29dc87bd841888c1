//! Markdown and transcript serialization. Pure formatting, no I/O beyond
//! the two save helpers.

use crate::error::Result;
use std::path::Path;

/// A key-frame reference as it appears in the final document.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRef {
    /// Image path relative to the Markdown file's own directory.
    pub rel_path: String,
    /// Source timestamp in seconds.
    pub timestamp_seconds: f64,
}

/// Format seconds as `HH:MM:SS`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Assemble the final Markdown document: the (refined or raw) transcript
/// body followed by one image reference per key frame, annotated with its
/// timestamp.
pub fn render_markdown(body: &str, frames: &[FrameRef]) -> String {
    let mut doc = String::with_capacity(body.len() + frames.len() * 64);

    doc.push_str(body.trim_end());
    doc.push_str("\n\n");

    if !frames.is_empty() {
        doc.push_str("# Key frames\n\n");
        for frame in frames {
            doc.push_str(&format!(
                "![keyframe {}]({})\n\n",
                format_timestamp(frame.timestamp_seconds),
                frame.rel_path
            ));
        }
    }

    doc
}

/// Path of `target` relative to `base_dir`, with forward slashes. Falls back
/// to the absolute path when `target` is not under `base_dir`.
pub fn relative_to(target: &Path, base_dir: &Path) -> String {
    match target.strip_prefix(base_dir) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => target.to_string_lossy().into_owned(),
    }
}

/// Persist text to a file, creating parent directories as needed.
pub fn save_text(text: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(59.999), "00:00:59");
        assert_eq!(format_timestamp(61.0), "00:01:01");
        assert_eq!(format_timestamp(3661.9), "01:01:01");
        assert_eq!(format_timestamp(7325.0), "02:02:05");
    }

    #[test]
    fn test_render_markdown_body_then_frames_in_order() {
        let frames = vec![
            FrameRef { rel_path: "abc/1.jpg".into(), timestamp_seconds: 0.0 },
            FrameRef { rel_path: "abc/2.jpg".into(), timestamp_seconds: 5.0 },
        ];

        let doc = render_markdown("hello world", &frames);

        let body_pos = doc.find("hello world").unwrap();
        let first = doc.find("![keyframe 00:00:00](abc/1.jpg)").unwrap();
        let second = doc.find("![keyframe 00:00:05](abc/2.jpg)").unwrap();
        assert!(body_pos < first && first < second);
    }

    #[test]
    fn test_render_markdown_without_frames_is_just_the_body() {
        let doc = render_markdown("only text\n", &[]);
        assert_eq!(doc, "only text\n\n");
        assert!(!doc.contains("# Key frames"));
    }

    #[test]
    fn test_relative_to_strips_the_document_directory() {
        let target = PathBuf::from("/home/u/.vidmark/md/cafebabe/3.jpg");
        let base = PathBuf::from("/home/u/.vidmark/md");
        assert_eq!(relative_to(&target, &base), "cafebabe/3.jpg");
    }

    #[test]
    fn test_relative_to_falls_back_to_the_full_path() {
        let target = PathBuf::from("/elsewhere/3.jpg");
        let base = PathBuf::from("/home/u/.vidmark/md");
        assert_eq!(relative_to(&target, &base), "/elsewhere/3.jpg");
    }
}
