//! Dataset Scanner
//!
//! Walks the configured media roots and produces an ordered list of
//! [`DiscoveredClip`], each cross-referenced against the loaded annotation
//! tables. Traversal is an explicit walk returning an immutable sequence;
//! nothing here mutates shared state.
//!
//! Dialect inference: a directory whose name case-insensitively matches a
//! dialect code assigns that dialect to everything beneath it, with the
//! nearest such directory winning over ancestors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::annotations::{Annotation, AnnotationCatalog};
use crate::core::settings::PipelineConfig;
use crate::core::types::{normalize_label, ClipId, Dialect, Label};

/// Source tag assigned to catch-all clips outside any sub-dataset
pub const EXTRA_SOURCE: &str = "extra";

/// Video file extensions considered by the scanner
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "m4v"];

// =============================================================================
// Discovered Clip
// =============================================================================

/// One clip found during scanning; consumed once by the scheduler
#[derive(Debug, Clone)]
pub struct DiscoveredClip {
    /// Absolute or config-relative path on disk
    pub path: PathBuf,
    /// Original filename including extension
    pub file_name: String,
    /// Clip id (the file stem), used for annotation lookup
    pub clip_id: ClipId,
    /// Resolved canonical label
    pub label: Label,
    /// Resolved dialect
    pub dialect: Dialect,
    /// Source tag string ("wlasl", "how2sign", ..., or "extra")
    pub source: String,
    /// Matched annotation, if any table knows this clip id
    pub annotation: Option<Annotation>,
    /// Lowercased file extension
    pub extension: String,
}

/// Scan result: discovery-ordered clips plus per-source clip counts
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub clips: Vec<DiscoveredClip>,
    pub source_counts: BTreeMap<String, u64>,
}

// =============================================================================
// Scanner
// =============================================================================

/// Walks media roots and cross-references annotations
pub struct DatasetScanner<'a> {
    config: &'a PipelineConfig,
    catalog: &'a AnnotationCatalog,
}

impl<'a> DatasetScanner<'a> {
    pub fn new(config: &'a PipelineConfig, catalog: &'a AnnotationCatalog) -> Self {
        Self { config, catalog }
    }

    /// Scans every structured sub-dataset root, then the catch-all root.
    ///
    /// Catch-all hits whose path falls inside a structured root are excluded
    /// to avoid double counting. `processing.limit` caps the total number of
    /// discovered clips.
    pub fn scan(&self) -> ScanOutcome {
        let limit = self.config.processing.limit;
        let mut outcome = ScanOutcome::default();

        for dataset in &self.config.datasets {
            self.scan_root(
                &dataset.media_dir,
                dataset.default_dialect,
                Some(dataset.source.as_str()),
                &[],
                limit,
                &mut outcome,
            );
        }

        let structured_roots: Vec<&Path> = self
            .config
            .datasets
            .iter()
            .map(|d| d.media_dir.as_path())
            .collect();
        self.scan_root(
            &self.config.extra_media_dir,
            Dialect::default(),
            None,
            &structured_roots,
            limit,
            &mut outcome,
        );

        info!(
            clips = outcome.clips.len(),
            sources = outcome.source_counts.len(),
            "Scan complete"
        );
        outcome
    }

    fn scan_root(
        &self,
        root: &Path,
        default_dialect: Dialect,
        source: Option<&str>,
        excluded_roots: &[&Path],
        limit: Option<usize>,
        outcome: &mut ScanOutcome,
    ) {
        if !root.is_dir() {
            debug!(root = %root.display(), "Media root missing, skipping");
            return;
        }

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if let Some(max) = limit {
                if outcome.clips.len() >= max {
                    return;
                }
            }

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            if excluded_roots.iter().any(|r| path.starts_with(r)) {
                continue;
            }

            let Some(clip) = self.discover(path, root, default_dialect, source) else {
                continue;
            };

            *outcome.source_counts.entry(clip.source.clone()).or_insert(0) += 1;
            outcome.clips.push(clip);
        }
    }

    fn discover(
        &self,
        path: &Path,
        root: &Path,
        default_dialect: Dialect,
        source: Option<&str>,
    ) -> Option<DiscoveredClip> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }

        let file_name = path.file_name()?.to_string_lossy().to_string();
        let clip_id = path.file_stem()?.to_string_lossy().to_string();

        let dir_dialect = infer_dialect_from_dirs(path, root);
        let annotation = self.catalog.resolve(&clip_id).cloned();

        let (label, dialect, source) = match &annotation {
            Some(ann) => (ann.label.clone(), ann.dialect, ann.source.as_str().to_string()),
            None => (
                derive_label_from_stem(&clip_id),
                dir_dialect.unwrap_or(default_dialect),
                source.unwrap_or(EXTRA_SOURCE).to_string(),
            ),
        };

        Some(DiscoveredClip {
            path: path.to_path_buf(),
            file_name,
            clip_id,
            label,
            dialect,
            source,
            annotation,
            extension,
        })
    }
}

// =============================================================================
// Label / Dialect Derivation
// =============================================================================

/// Finds the nearest directory between `root` and the file whose name is a
/// dialect code.
fn infer_dialect_from_dirs(path: &Path, root: &Path) -> Option<Dialect> {
    let relative = path.strip_prefix(root).ok()?;
    let mut found = None;
    for component in relative.parent()?.components() {
        if let Some(dialect) = Dialect::from_code(&component.as_os_str().to_string_lossy()) {
            found = Some(dialect);
        }
    }
    found
}

/// Derives a label from a filename stem with no annotation match.
///
/// Strips a trailing quality suffix (digits + "p"), a leading "sign_"
/// prefix, and a trailing "_v<digits>" version suffix, then normalizes the
/// remainder to an uppercase underscore token.
pub fn derive_label_from_stem(stem: &str) -> Label {
    static QUALITY_RE: OnceLock<Regex> = OnceLock::new();
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();

    let quality = QUALITY_RE.get_or_init(|| Regex::new(r"[-_]?\d+p$").unwrap());
    let version = VERSION_RE.get_or_init(|| Regex::new(r"[-_]v\d+$").unwrap());

    let mut stripped = quality.replace(stem, "").to_string();
    if let Some(rest) = stripped.strip_prefix("sign_") {
        stripped = rest.to_string();
    }
    stripped = version.replace(&stripped, "").to_string();

    normalize_label(&stripped)
}
