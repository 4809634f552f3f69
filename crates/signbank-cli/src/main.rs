//! SignBank CLI
//!
//! Headless entry point for the corpus ingestion pipeline: loads config,
//! verifies the external media tools, runs the pipeline, and prints the
//! end-of-run summary.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use signbank_core::core::media::{require_tools, FfmpegTools, MediaTools};
use signbank_core::core::pipeline::{self, RunReport};
use signbank_core::core::settings::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "signbank", about = "Sign-language corpus ingestion pipeline", version)]
struct Cli {
    /// Path to the pipeline config file
    #[arg(long, default_value = "signbank.json")]
    config: PathBuf,

    /// Ignore any previously persisted index and rebuild from scratch
    #[arg(long)]
    rebuild: bool,

    /// Generate every quality preset instead of only the default
    #[arg(long)]
    all_presets: bool,

    /// Re-process clips even when they are already indexed
    #[arg(long)]
    force: bool,

    /// Process only the first N discovered clips
    #[arg(long)]
    limit: Option<usize>,

    /// Print the run report as JSON instead of log lines
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn print_summary(report: &RunReport) {
    info!(
        processed = report.stats.processed,
        failed = report.stats.failed,
        skipped = report.stats.skipped,
        "Run finished"
    );
    for (dialect, count) in &report.dialect_counts {
        info!(dialect = %dialect, signs = count, "Dialect total");
    }
    for (source, count) in &report.source_counts {
        info!(source = %source, clips = count, "Source total");
    }
    info!(
        total_signs = report.total_signs,
        index = %report.index_path.display(),
        "Index written"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config =
        PipelineConfig::load(&cli.config).with_context(|| "Failed to load pipeline config")?;
    if cli.rebuild {
        config.processing.rebuild = true;
    }
    if cli.all_presets {
        config.processing.all_presets = true;
    }
    if cli.force {
        config.processing.skip_existing = false;
    }
    if cli.limit.is_some() {
        config.processing.limit = cli.limit;
    }

    // Fatal precondition: both tools must be reachable before any scanning.
    let tool_paths = match require_tools() {
        Ok(paths) => paths,
        Err(e) => {
            error!(error = %e, "External media tools unavailable");
            eprintln!(
                "signbank requires ffmpeg and ffprobe. Install them (e.g. `apt install ffmpeg` \
                 or `brew install ffmpeg`) and make sure both binaries are on PATH."
            );
            std::process::exit(1);
        }
    };
    info!(
        ffmpeg = %tool_paths.ffmpeg_path.display(),
        version = %tool_paths.version,
        "Media tools detected"
    );

    let tools: Arc<dyn MediaTools> = Arc::new(FfmpegTools::new(
        tool_paths,
        Duration::from_secs(config.processing.tool_timeout_secs),
    ));

    // Finish in-flight clips and flush the index on Ctrl-C.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown requested, finishing in-flight clips");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let report = pipeline::run(&config, tools, shutdown).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}
