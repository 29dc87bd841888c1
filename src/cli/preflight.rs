//! Pre-flight checks before expensive operations.
//!
//! Validates that the required external tools are available before starting
//! a pipeline run that would otherwise fail midway.

use crate::error::{Result, VidmarkError};
use crate::source::VideoSource;
use std::process::Command;

/// Run pre-flight checks for the given input.
///
/// ffmpeg and ffprobe are always required; yt-dlp only for remote inputs.
pub fn check(source: &VideoSource) -> Result<()> {
    check_tool("ffmpeg")?;
    check_tool("ffprobe")?;

    if matches!(source, VideoSource::Remote(_)) {
        check_tool("yt-dlp")?;
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidmarkError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidmarkError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidmarkError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
