//! Vidmark CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidmark::cli::{preflight, Cli, Output};
use vidmark::config::Settings;
use vidmark::orchestrator::Orchestrator;
use vidmark::source::VideoSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidmark={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // CLI overrides
    if cli.no_refine {
        settings.refine.enabled = false;
    }
    if let Some(max_frames) = cli.max_frames {
        settings.frames.max_frames = max_frames;
    }

    // Fail early if the required external tools are missing
    let source = VideoSource::parse(&cli.input);
    if let Err(e) = preflight::check(&source) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    Output::info(&format!("Processing: {}", cli.input));

    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.process_video(&cli.input, cli.force).await {
        Ok(outcome) => {
            if orchestrator.settings().refine.enabled && !outcome.refined {
                Output::warning("Transcript was not refined; the document carries the raw text.");
            }
            Output::success("Done.");
            Output::kv("Markdown", &outcome.markdown_path.display().to_string());
            Output::kv("Transcript", &outcome.transcript_path.display().to_string());
            Output::kv("Key frames", &outcome.frames_written.to_string());
            println!("{}", outcome.markdown_path.display());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to process: {}", e));
            Err(e.into())
        }
    }
}
