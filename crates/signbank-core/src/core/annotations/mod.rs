//! Annotation Loading and Reconciliation
//!
//! Each sub-dataset ships annotations in its own format:
//! - word-level label groups with per-instance clip ids (`word`)
//! - sentence-level delimited text files in two column schemas (`sentence`)
//! - notation entries carrying a writing-system string (`notation`)
//!
//! Loaders normalize everything into one [`Annotation`] shape, keyed by clip
//! id and scoped per source tag. A missing or malformed source yields an
//! empty table for that source only; it never fails the run.

mod notation;
mod sentence;
mod word;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::settings::DatasetConfig;
use crate::core::types::{ClipId, Dialect, Label, SourceTag};
use crate::core::{PipelineError, PipelineResult};

// =============================================================================
// Annotation
// =============================================================================

/// Normalized per-source annotation for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Canonical sign label
    pub label: Label,
    /// Dialect this annotation belongs to
    pub dialect: Dialect,
    /// Source table this annotation came from
    pub source: SourceTag,
    /// Optional sign category (e.g. "greeting")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Natural-language sentence for sentence-level clips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    /// Ordered gloss sequence for sentence-level clips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_sequence: Option<Vec<String>>,
    /// Writing-system notation string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    /// Train/val/test split tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    /// Signer bounding box [x, y, w, h]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<i32>>,
}

/// Clip-id keyed table for one source
pub type AnnotationTable = HashMap<ClipId, Annotation>;

// =============================================================================
// Catalog
// =============================================================================

/// All loaded annotation tables, one per source tag
#[derive(Debug, Default)]
pub struct AnnotationCatalog {
    tables: BTreeMap<SourceTag, AnnotationTable>,
}

impl AnnotationCatalog {
    /// Loads annotations for every configured sub-dataset.
    ///
    /// Per-source failures are logged and produce an empty table; only the
    /// successfully parsed sources contribute annotations.
    pub fn load(datasets: &[DatasetConfig]) -> Self {
        let mut catalog = Self::default();

        for dataset in datasets {
            let loaded = match dataset.source {
                SourceTag::WordLevel => {
                    word::load(&dataset.annotation_paths, dataset.default_dialect)
                }
                SourceTag::SentenceLevel | SourceTag::SentenceLevelPhoenix => sentence::load(
                    &dataset.annotation_paths,
                    dataset.default_dialect,
                    dataset.source,
                ),
                SourceTag::NotationLevel => {
                    notation::load(&dataset.annotation_paths, dataset.default_dialect)
                }
            };

            let table = match loaded {
                Ok(table) => table,
                Err(PipelineError::SourceUnavailable(msg)) => {
                    warn!(source = %dataset.source, %msg, "Annotation source unavailable, skipping");
                    AnnotationTable::new()
                }
                Err(e) => {
                    warn!(source = %dataset.source, error = %e, "Annotation parse failed, using empty table");
                    AnnotationTable::new()
                }
            };

            info!(source = %dataset.source, entries = table.len(), "Loaded annotation table");
            catalog.tables.entry(dataset.source).or_default().extend(table);
        }

        catalog
    }

    /// Resolves the annotation for a clip id across all tables using the
    /// fixed priority order (word-level first, notation-level last).
    pub fn resolve(&self, clip_id: &str) -> Option<&Annotation> {
        SourceTag::PRIORITY
            .iter()
            .filter_map(|tag| self.tables.get(tag))
            .find_map(|table| table.get(clip_id))
    }

    /// Table for one source, if loaded.
    pub fn table(&self, source: SourceTag) -> Option<&AnnotationTable> {
        self.tables.get(&source)
    }

    /// Total annotations across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn insert_table(&mut self, source: SourceTag, table: AnnotationTable) {
        self.tables.insert(source, table);
    }
}

// =============================================================================
// Shared loader helpers
// =============================================================================

/// Expands configured annotation paths into a flat, sorted file list.
///
/// Directories contribute their directly contained files. A missing path is
/// a `SourceUnavailable` error; the caller converts it into an empty table.
pub(crate) fn expand_files(paths: &[PathBuf]) -> PipelineResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(PipelineError::SourceUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

pub(crate) fn read_annotation_file(path: &Path) -> PipelineResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PipelineError::SourceUnavailable(format!("{}: {e}", path.display()))
    })
}
