//! Pipeline Configuration
//!
//! Provides persistent pipeline configuration with:
//! - Schema validation with defaults for every field
//! - A tolerant `normalize()` pass that clamps bad values instead of failing
//! - Atomic file writes (temp file + rename)
//!
//! Storage location: a JSON file supplied by the caller (the CLI defaults to
//! `signbank.json` in the working directory).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::media::QualityPreset;
use crate::core::types::{Dialect, SourceTag};
use crate::core::{fs, PipelineError, PipelineResult};

/// Config schema version for migration support
pub const CONFIG_VERSION: u32 = 1;

// =============================================================================
// Pipeline Config
// =============================================================================

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Structured sub-dataset roots to ingest
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,

    /// Catch-all media root for ad hoc clips outside any sub-dataset
    #[serde(default = "default_extra_media_dir")]
    pub extra_media_dir: PathBuf,

    /// Output root for transcoded assets
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Output root for thumbnails
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,

    /// Path of the persisted index document
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Processing knobs
    #[serde(default)]
    pub processing: ProcessingConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_extra_media_dir() -> PathBuf {
    PathBuf::from("data/raw/extra")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("data/thumbnails")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("data/metadata/video_index.json")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            datasets: Vec::new(),
            extra_media_dir: default_extra_media_dir(),
            processed_dir: default_processed_dir(),
            thumbnail_dir: default_thumbnail_dir(),
            index_path: default_index_path(),
            processing: ProcessingConfig::default(),
        }
    }
}

// =============================================================================
// Dataset Config
// =============================================================================

/// One structured sub-dataset: a media root plus its annotation files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    /// Annotation source tag; also selects the annotation parser
    pub source: SourceTag,

    /// Media root for this sub-dataset
    pub media_dir: PathBuf,

    /// Annotation files (or directories of files) for this sub-dataset
    #[serde(default)]
    pub annotation_paths: Vec<PathBuf>,

    /// Dialect assigned to clips when nothing more specific applies
    #[serde(default)]
    pub default_dialect: Dialect,
}

// =============================================================================
// Processing Config
// =============================================================================

/// Knobs for the transcode/batch stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Quality preset used for the primary variant
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Generate every known preset instead of only the default
    #[serde(default = "default_false")]
    pub all_presets: bool,

    /// Skip clips whose primary asset is already indexed
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Clips per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Worker pool size; 0 means one worker per CPU core
    #[serde(default)]
    pub max_workers: usize,

    /// Timeout applied to each external tool invocation
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Process only the first N discovered clips (test/limited mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Ignore any previously persisted index and rebuild from scratch
    #[serde(default = "default_false")]
    pub rebuild: bool,
}

fn default_preset() -> String {
    QualityPreset::default().name.to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_batch_size() -> usize {
    50
}

fn default_tool_timeout_secs() -> u64 {
    120
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            all_presets: false,
            skip_existing: true,
            batch_size: default_batch_size(),
            max_workers: 0,
            tool_timeout_secs: default_tool_timeout_secs(),
            limit: None,
            rebuild: false,
        }
    }
}

impl PipelineConfig {
    /// Normalizes and clamps settings so a loaded config is always usable.
    ///
    /// This is intentionally tolerant: it corrects bad values instead of
    /// failing, so old or hand-edited configs don't brick the pipeline.
    pub fn normalize(&mut self) {
        self.version = CONFIG_VERSION;

        if QualityPreset::by_name(&self.processing.default_preset).is_none() {
            warn!(
                preset = %self.processing.default_preset,
                "Unknown quality preset in config, falling back to default"
            );
            self.processing.default_preset = default_preset();
        }

        self.processing.batch_size = self.processing.batch_size.clamp(1, 1000);
        if self.processing.max_workers == 0 {
            self.processing.max_workers = num_cpus::get().max(1);
        }
        self.processing.max_workers = self.processing.max_workers.clamp(1, 32);
        self.processing.tool_timeout_secs = self.processing.tool_timeout_secs.clamp(5, 3600);
    }

    /// Loads config from `path`, or returns defaults when the file is absent.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            let mut config = Self::default();
            config.normalize();
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config: PipelineConfig = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        config.normalize();
        Ok(config)
    }

    /// Saves config to `path` atomically.
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        fs::atomic_write_json_pretty(path, self)
    }

    /// Resolves the configured presets for one transcode pass.
    ///
    /// The first element is always the primary preset.
    pub fn presets(&self) -> Vec<QualityPreset> {
        let primary = QualityPreset::by_name(&self.processing.default_preset)
            .unwrap_or_default();
        if !self.processing.all_presets {
            return vec![primary];
        }
        let mut presets = vec![primary.clone()];
        for preset in QualityPreset::all() {
            if preset.name != primary.name {
                presets.push(preset);
            }
        }
        presets
    }
}
