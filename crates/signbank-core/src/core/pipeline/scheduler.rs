//! Batch Scheduler
//!
//! Drives the processor over all discovered clips in fixed-size batches,
//! strictly in discovery order. Within a batch, clips run on a bounded
//! worker pool; clips sharing a (dialect, label) key are serialized so
//! they never write the same asset paths concurrently. The shared index
//! and run counters are the only mutable state and both sit behind a mutex.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::processor::{ClipOutcome, VideoProcessor};
use crate::core::index::SignIndex;
use crate::core::scanner::DiscoveredClip;
use crate::core::settings::PipelineConfig;
use crate::core::types::{Dialect, Label};

/// Run counters; every clip increments exactly one of these
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub processed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunStats {
    fn record(&mut self, outcome: ClipOutcome) {
        match outcome {
            ClipOutcome::Processed => self.processed += 1,
            ClipOutcome::Failed => self.failed += 1,
            ClipOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Partitions clips into batches and runs them on a bounded worker pool
pub struct BatchScheduler {
    processor: Arc<VideoProcessor>,
    batch_size: usize,
    max_workers: usize,
    shutdown: Arc<AtomicBool>,
}

impl BatchScheduler {
    pub fn new(
        processor: Arc<VideoProcessor>,
        config: &PipelineConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            processor,
            batch_size: config.processing.batch_size,
            max_workers: config.processing.max_workers,
            shutdown,
        }
    }

    /// Processes every clip, returning the accumulated counters.
    ///
    /// The shutdown flag is honored between batches: in-flight clips finish
    /// and the remaining batches are abandoned. Failed clips are not retried
    /// within the run.
    pub async fn run(&self, clips: Vec<DiscoveredClip>, index: Arc<Mutex<SignIndex>>) -> RunStats {
        let mut stats = RunStats::default();
        if clips.is_empty() {
            info!("No clips discovered, nothing to process");
            return stats;
        }

        let total_batches = clips.len().div_ceil(self.batch_size);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        for (batch_no, batch) in clips.chunks(self.batch_size).enumerate() {
            if self.shutdown.load(Ordering::SeqCst) {
                warn!(
                    remaining = clips.len() as u64 - stats.processed - stats.failed - stats.skipped,
                    "Shutdown requested, abandoning remaining batches"
                );
                break;
            }

            info!(
                batch = batch_no + 1,
                total = total_batches,
                clips = batch.len(),
                "Processing batch"
            );

            for round in partition_rounds(batch) {
                let mut tasks = JoinSet::new();
                for clip in round {
                    let processor = Arc::clone(&self.processor);
                    let index = Arc::clone(&index);
                    let semaphore = Arc::clone(&semaphore);
                    tasks.spawn(async move {
                        // Closed only on scheduler drop; safe to unwrap here.
                        let _permit = semaphore.acquire_owned().await.unwrap();
                        processor.process(&clip, &index).await
                    });
                }

                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(outcome) => stats.record(outcome),
                        Err(e) => {
                            error!(error = %e, "Clip task panicked");
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        info!(
            processed = stats.processed,
            failed = stats.failed,
            skipped = stats.skipped,
            "Batch run complete"
        );
        stats
    }
}

/// Splits one batch into rounds run back to back, such that no two clips
/// sharing a (dialect, label) key are ever in flight together. Asset paths
/// are a pure function of that key, so concurrent duplicates would write
/// the same output files; serializing them keeps discovery order, which is
/// what makes the later duplicate the one that lands in the index.
fn partition_rounds(batch: &[DiscoveredClip]) -> Vec<Vec<DiscoveredClip>> {
    let mut keys: Vec<HashSet<(Dialect, Label)>> = Vec::new();
    let mut rounds: Vec<Vec<DiscoveredClip>> = Vec::new();

    for clip in batch {
        let key = (clip.dialect, clip.label.clone());
        match keys.iter().position(|seen| !seen.contains(&key)) {
            Some(i) => {
                keys[i].insert(key);
                rounds[i].push(clip.clone());
            }
            None => {
                keys.push(HashSet::from([key]));
                rounds.push(vec![clip.clone()]);
            }
        }
    }

    rounds
}
