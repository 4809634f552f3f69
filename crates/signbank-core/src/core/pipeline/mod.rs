//! Pipeline Orchestration
//!
//! Wires the stages together for one full run:
//! annotations → scan → batch processing → index finalize/save.
//!
//! The caller supplies the media tools adapter (real or fake) and a shutdown
//! flag; tool availability must be verified before calling [`run`] since a
//! missing prober/transcoder is a fatal precondition, not a per-clip error.

pub mod processor;
pub mod scheduler;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::annotations::AnnotationCatalog;
use crate::core::index::IndexStore;
use crate::core::media::MediaTools;
use crate::core::scanner::DatasetScanner;
use crate::core::settings::PipelineConfig;
use crate::core::PipelineResult;

pub use processor::{ClipOutcome, VideoProcessor};
pub use scheduler::{BatchScheduler, RunStats};

/// End-of-run summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Per-clip counters
    pub stats: RunStats,
    /// Total labels across all dialects
    pub total_signs: u64,
    /// Per-dialect label totals
    pub dialect_counts: BTreeMap<String, u64>,
    /// Per-source clip totals from this scan
    pub source_counts: BTreeMap<String, u64>,
    /// Where the index document was written
    pub index_path: PathBuf,
}

/// Executes one complete pipeline run.
pub async fn run(
    config: &PipelineConfig,
    tools: Arc<dyn MediaTools>,
    shutdown: Arc<AtomicBool>,
) -> PipelineResult<RunReport> {
    let catalog = AnnotationCatalog::load(&config.datasets);
    info!(annotations = catalog.len(), "Annotation tables ready");

    let scan = DatasetScanner::new(config, &catalog).scan();

    let store = IndexStore::new(&config.index_path);
    let index = Arc::new(Mutex::new(store.load(config.processing.rebuild)));

    let processor = Arc::new(VideoProcessor::new(tools, config));
    let scheduler = BatchScheduler::new(processor, config, shutdown);
    let stats = scheduler.run(scan.clips, Arc::clone(&index)).await;

    let mut index = index.lock().unwrap();
    index.finalize(&scan.source_counts, stats.processed > 0 || stats.failed > 0);

    // A failed write is logged, not fatal; the run's counters still stand.
    if let Err(e) = store.save(&index) {
        warn!(path = %config.index_path.display(), error = %e, "Index write failed, durability not guaranteed");
    }

    let meta = index.meta();
    Ok(RunReport {
        stats,
        total_signs: meta.total_signs,
        dialect_counts: meta.dialect_counts.clone(),
        source_counts: meta.source_counts.clone(),
        index_path: config.index_path.clone(),
    })
}
