//! Video Processor
//!
//! Per-clip processing: probe metadata, extract a thumbnail, produce the
//! requested quality variants, and record the resulting [`IndexEntry`].
//! All work is idempotent via on-disk existence checks, and every failure is
//! isolated to the clip at hand.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::core::index::{ContextBlock, IndexEntry, SignIndex, TechMetadata};
use crate::core::media::{MediaTools, ProbeReport, QualityPreset};
use crate::core::scanner::DiscoveredClip;
use crate::core::settings::PipelineConfig;
use crate::core::types::Dialect;
use crate::core::PipelineError;

/// Thumbnail frame offset into the clip
const THUMBNAIL_OFFSET_SECS: f64 = 0.5;

/// Outcome of processing one clip; each clip increments exactly one counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Probed, thumbnailed, transcoded, and indexed
    Processed,
    /// Already indexed; no tool calls were made
    Skipped,
    /// Primary transcode failed; no index entry recorded
    Failed,
}

/// Processes one discovered clip into on-disk assets and an index entry
pub struct VideoProcessor {
    tools: Arc<dyn MediaTools>,
    processed_dir: PathBuf,
    thumbnail_dir: PathBuf,
    /// Presets for this run; the first is always the primary
    presets: Vec<QualityPreset>,
    skip_existing: bool,
}

impl VideoProcessor {
    pub fn new(tools: Arc<dyn MediaTools>, config: &PipelineConfig) -> Self {
        Self {
            tools,
            processed_dir: config.processed_dir.clone(),
            thumbnail_dir: config.thumbnail_dir.clone(),
            presets: config.presets(),
            skip_existing: config.processing.skip_existing,
        }
    }

    /// Asset path for one quality variant:
    /// `<processed-root>/<dialect-lowercase>/<LABEL>_<preset>.mp4`
    pub fn variant_path(&self, dialect: Dialect, label: &str, preset: &QualityPreset) -> PathBuf {
        self.processed_dir
            .join(dialect.dir_name())
            .join(format!("{label}_{}.mp4", preset.name))
    }

    /// Thumbnail path: `<thumbnail-root>/<dialect-lowercase>/<LABEL>.jpg`
    pub fn thumbnail_path(&self, dialect: Dialect, label: &str) -> PathBuf {
        self.thumbnail_dir
            .join(dialect.dir_name())
            .join(format!("{label}.jpg"))
    }

    /// Processes one clip, updating the shared index on success.
    pub async fn process(&self, clip: &DiscoveredClip, index: &Mutex<SignIndex>) -> ClipOutcome {
        if self.skip_existing && index.lock().unwrap().is_indexed(clip.dialect, &clip.label) {
            debug!(label = %clip.label, dialect = %clip.dialect, "Already indexed, skipping");
            return ClipOutcome::Skipped;
        }

        // Probe failure is non-fatal: substitute defaults and keep going.
        let report = match self.tools.probe(&clip.path).await {
            Ok(report) => report,
            Err(e) => {
                let err = PipelineError::from(e);
                warn!(clip = %clip.file_name, error = %err, "Probe failed, using default metadata");
                ProbeReport::default()
            }
        };

        let thumbnail_path = self.extract_thumbnail(clip).await;
        let variants = match self.transcode_variants(clip).await {
            Some(variants) => variants,
            None => return ClipOutcome::Failed,
        };

        let primary = self.presets[0].name;
        let entry = IndexEntry {
            video_path: variants[primary].clone(),
            thumbnail_path,
            duration_secs: report.duration_secs,
            source: clip.source.clone(),
            variants,
            metadata: TechMetadata {
                frame_rate: report.frame_rate,
                resolution: report.resolution(),
                original_file: clip.file_name.clone(),
                video_id: clip.clip_id.clone(),
            },
            context: context_block(clip),
        };

        index
            .lock()
            .unwrap()
            .insert(clip.dialect, clip.label.clone(), entry);
        ClipOutcome::Processed
    }

    /// Best-effort thumbnail: failures are swallowed and no counter moves.
    async fn extract_thumbnail(&self, clip: &DiscoveredClip) -> Option<String> {
        let path = self.thumbnail_path(clip.dialect, &clip.label);
        if !path.exists() {
            if let Err(e) = self
                .tools
                .thumbnail(&clip.path, THUMBNAIL_OFFSET_SECS, &path)
                .await
            {
                let err = PipelineError::from(e);
                debug!(clip = %clip.file_name, error = %err, "Thumbnail extraction failed");
            }
        }
        path.exists().then(|| path.to_string_lossy().to_string())
    }

    /// Produces every requested variant, skipping those already on disk.
    ///
    /// A failed primary transcode fails the clip; a failed secondary variant
    /// only drops that variant from the entry.
    async fn transcode_variants(&self, clip: &DiscoveredClip) -> Option<BTreeMap<String, String>> {
        let mut variants = BTreeMap::new();

        for (position, preset) in self.presets.iter().enumerate() {
            let out = self.variant_path(clip.dialect, &clip.label, preset);
            if !out.exists() {
                if let Err(e) = self.tools.transcode(&clip.path, preset, &out).await {
                    let err = PipelineError::from(e);
                    if position == 0 {
                        warn!(
                            clip = %clip.file_name,
                            preset = preset.name,
                            error = %err,
                            "Primary transcode failed, clip not indexed"
                        );
                        return None;
                    }
                    warn!(
                        clip = %clip.file_name,
                        preset = preset.name,
                        error = %err,
                        "Variant transcode failed, entry will omit it"
                    );
                    continue;
                }
            }
            variants.insert(preset.name.to_string(), out.to_string_lossy().to_string());
        }

        Some(variants)
    }
}

fn context_block(clip: &DiscoveredClip) -> Option<ContextBlock> {
    let ann = clip.annotation.as_ref()?;
    if ann.category.is_none()
        && ann.sentence.is_none()
        && ann.label_sequence.is_none()
        && ann.notation.is_none()
    {
        return None;
    }
    Some(ContextBlock {
        category: ann.category.clone(),
        sentence: ann.sentence.clone(),
        label_sequence: ann.label_sequence.clone(),
        notation: ann.notation.clone(),
    })
}
