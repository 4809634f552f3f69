//! Lookup Index
//!
//! The persisted output of a pipeline run: a mapping from dialect code to a
//! mapping from sign label to [`IndexEntry`], plus one reserved `_meta`
//! record holding aggregate statistics. The reserved key is a sibling of the
//! dialect codes in the JSON document but is never treated as a dialect.
//!
//! The store owns the load/save lifecycle so the pipeline can be tested
//! against a temp directory; a run seeds its in-memory index from the prior
//! document unless a rebuild is requested.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::types::Dialect;
use crate::core::{fs, PipelineError, PipelineResult};

/// Index schema version
pub const INDEX_VERSION: u32 = 1;

/// Reserved top-level key holding the metadata record
pub const RESERVED_META_KEY: &str = "_meta";

// =============================================================================
// Entries
// =============================================================================

/// Technical metadata persisted per entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechMetadata {
    /// Frame rate, rounded to the nearest integer
    pub frame_rate: u32,
    /// "WxH" resolution string
    pub resolution: String,
    /// Original filename of the source clip
    pub original_file: String,
    /// Clip id the entry was built from
    pub video_id: String,
}

/// Optional annotation-derived context persisted per entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_sequence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
}

/// Persisted unit keyed by (dialect, label)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Primary-quality asset path
    pub video_path: String,
    /// Thumbnail path, when extraction succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    /// Duration in seconds
    pub duration_secs: f64,
    /// Source tag string the clip came from
    pub source: String,
    /// Quality label → asset path for every produced variant
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
    /// Probed technical metadata
    pub metadata: TechMetadata,
    /// Annotation context, when an annotation was matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextBlock>,
}

/// Reserved metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMeta {
    /// Schema version
    pub version: u32,
    /// RFC 3339 generation timestamp
    #[serde(default)]
    pub generated_at: String,
    /// Total label count across all dialects
    #[serde(default)]
    pub total_signs: u64,
    /// Per-dialect label counts
    #[serde(default)]
    pub dialect_counts: BTreeMap<String, u64>,
    /// Per-source clip counts from the last scan
    #[serde(default)]
    pub source_counts: BTreeMap<String, u64>,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            generated_at: String::new(),
            total_signs: 0,
            dialect_counts: BTreeMap::new(),
            source_counts: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Sign Index
// =============================================================================

/// In-memory index: dialect code → label → entry, plus the reserved record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignIndex {
    dialects: BTreeMap<String, BTreeMap<String, IndexEntry>>,
    meta: IndexMeta,
}

impl SignIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks an entry up by (dialect, label).
    pub fn entry(&self, dialect: Dialect, label: &str) -> Option<&IndexEntry> {
        self.dialects.get(dialect.code()).and_then(|m| m.get(label))
    }

    /// True when a primary asset path is already recorded at (dialect, label).
    pub fn is_indexed(&self, dialect: Dialect, label: &str) -> bool {
        self.entry(dialect, label)
            .map(|e| !e.video_path.is_empty())
            .unwrap_or(false)
    }

    /// Inserts or replaces the entry at (dialect, label).
    pub fn insert(&mut self, dialect: Dialect, label: String, entry: IndexEntry) {
        self.dialects
            .entry(dialect.code().to_string())
            .or_default()
            .insert(label, entry);
    }

    /// Labels recorded for one dialect.
    pub fn labels(&self, dialect: Dialect) -> Option<&BTreeMap<String, IndexEntry>> {
        self.dialects.get(dialect.code())
    }

    /// Total entries across all dialects.
    pub fn total_signs(&self) -> u64 {
        self.dialects.values().map(|m| m.len() as u64).sum()
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Computes and attaches aggregate statistics before persisting.
    ///
    /// The generation timestamp is only refreshed when this run changed the
    /// index, so an unchanged re-run persists a byte-identical document.
    pub fn finalize(&mut self, source_counts: &BTreeMap<String, u64>, changed: bool) {
        self.meta.version = INDEX_VERSION;
        self.meta.dialect_counts = self
            .dialects
            .iter()
            .map(|(code, labels)| (code.clone(), labels.len() as u64))
            .collect();
        self.meta.total_signs = self.total_signs();
        if !source_counts.is_empty() {
            self.meta.source_counts = source_counts.clone();
        }
        if changed || self.meta.generated_at.is_empty() {
            self.meta.generated_at = chrono::Utc::now().to_rfc3339();
        }
    }

    /// Serializes to the persisted document shape.
    pub fn to_json(&self) -> PipelineResult<serde_json::Value> {
        let mut doc = serde_json::Map::new();
        for (code, labels) in &self.dialects {
            doc.insert(code.clone(), serde_json::to_value(labels)?);
        }
        doc.insert(
            RESERVED_META_KEY.to_string(),
            serde_json::to_value(&self.meta)?,
        );
        Ok(serde_json::Value::Object(doc))
    }

    /// Rebuilds an index from the persisted document shape.
    pub fn from_json(value: serde_json::Value) -> PipelineResult<Self> {
        let serde_json::Value::Object(mut doc) = value else {
            return Err(crate::core::PipelineError::ParseFailure(
                "index document is not an object".to_string(),
            ));
        };

        let meta = match doc.remove(RESERVED_META_KEY) {
            Some(raw) => serde_json::from_value(raw)?,
            None => IndexMeta::default(),
        };

        let mut dialects = BTreeMap::new();
        for (code, labels) in doc {
            let labels: BTreeMap<String, IndexEntry> = serde_json::from_value(labels)?;
            dialects.insert(code, labels);
        }

        Ok(Self { dialects, meta })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Load/save lifecycle for the persisted index document
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the prior index, or an empty one when rebuilding, when the file
    /// is absent, or when the document is unreadable.
    pub fn load(&self, rebuild: bool) -> SignIndex {
        if rebuild {
            info!("Rebuild requested, starting from an empty index");
            return SignIndex::new();
        }
        if !self.path.exists() {
            return SignIndex::new();
        }

        let loaded = std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
            .and_then(|value| SignIndex::from_json(value).map_err(|e| e.to_string()));

        match loaded {
            Ok(index) => {
                info!(
                    path = %self.path.display(),
                    signs = index.total_signs(),
                    "Seeded index from prior document"
                );
                index
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Prior index unreadable, starting empty");
                SignIndex::new()
            }
        }
    }

    /// Persists the index atomically.
    ///
    /// Any failure surfaces as [`PipelineError::PersistenceFailure`]; the
    /// caller decides whether to treat it as fatal.
    pub fn save(&self, index: &SignIndex) -> PipelineResult<()> {
        index
            .to_json()
            .and_then(|doc| fs::atomic_write_json_pretty(&self.path, &doc))
            .map_err(|e| {
                PipelineError::PersistenceFailure(format!("{}: {e}", self.path.display()))
            })
    }
}
