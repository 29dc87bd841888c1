//! CLI surface for Vidmark.

mod output;
pub mod preflight;

pub use output::Output;

use clap::Parser;

/// Vidmark - Video to Markdown
///
/// Turns a video (local file or a supported hosting URL) into a Markdown
/// document with a refined transcript and key-frame images.
#[derive(Parser, Debug)]
#[command(name = "vidmark")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Video file path, or a URL on a supported platform (YouTube, Bilibili)
    pub input: String,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Skip the LLM refinement stage and keep the raw transcript
    #[arg(long)]
    pub no_refine: bool,

    /// Re-run every stage even when cached artifacts exist
    #[arg(short, long)]
    pub force: bool,

    /// Override the maximum number of key frames to sample
    #[arg(long)]
    pub max_frames: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_input() {
        let cli = Cli::parse_from(["vidmark", "clip.mp4"]);
        assert_eq!(cli.input, "clip.mp4");
        assert!(!cli.no_refine);
        assert!(!cli.force);
        assert_eq!(cli.max_frames, None);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "vidmark",
            "--no-refine",
            "--force",
            "--max-frames",
            "5",
            "-vv",
            "https://youtu.be/abc",
        ]);
        assert!(cli.no_refine);
        assert!(cli.force);
        assert_eq!(cli.max_frames, Some(5));
        assert_eq!(cli.verbose, 2);
    }
}
