//! Core Vocabulary Types
//!
//! Identifiers shared across the pipeline: dialect codes, annotation source
//! tags, and label normalization.

use serde::{Deserialize, Serialize};

/// Clip identifier as used by annotation files (usually the file stem).
pub type ClipId = String;

/// Canonical sign label: uppercase, underscore-normalized.
pub type Label = String;

// =============================================================================
// Dialect
// =============================================================================

/// Sign-language dialect codes recognized by the pipeline.
///
/// The dialect is the primary partition key of the index. Directory names
/// matching a code (case-insensitively) assign that dialect to every clip
/// beneath them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// American Sign Language
    #[serde(rename = "ASL")]
    Asl,
    /// British Sign Language
    #[serde(rename = "BSL")]
    Bsl,
    /// German Sign Language (Deutsche Gebärdensprache)
    #[serde(rename = "DGS")]
    Dgs,
    /// Irish Sign Language
    #[serde(rename = "ISL")]
    Isl,
    /// Chinese Sign Language
    #[serde(rename = "CSL")]
    Csl,
}

impl Dialect {
    /// All recognized dialects.
    pub const ALL: [Dialect; 5] = [
        Dialect::Asl,
        Dialect::Bsl,
        Dialect::Dgs,
        Dialect::Isl,
        Dialect::Csl,
    ];

    /// Uppercase dialect code used as index key (e.g. "ASL").
    pub fn code(&self) -> &'static str {
        match self {
            Dialect::Asl => "ASL",
            Dialect::Bsl => "BSL",
            Dialect::Dgs => "DGS",
            Dialect::Isl => "ISL",
            Dialect::Csl => "CSL",
        }
    }

    /// Lowercase directory name used for output layout (e.g. "asl").
    pub fn dir_name(&self) -> String {
        self.code().to_ascii_lowercase()
    }

    /// Parses a dialect code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Dialect> {
        Dialect::ALL
            .iter()
            .copied()
            .find(|d| d.code().eq_ignore_ascii_case(code))
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Asl
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Source Tag
// =============================================================================

/// Annotation source tags.
///
/// Variant order is the resolution priority: when the same clip id appears in
/// more than one loaded table, the table with the lowest-ordered tag wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Word-level entries: label groups with per-instance clip ids.
    #[serde(rename = "wlasl")]
    WordLevel,
    /// Sentence-level delimited text, How2Sign-style columns.
    #[serde(rename = "how2sign")]
    SentenceLevel,
    /// Sentence-level pipe-delimited text, Phoenix-style columns.
    #[serde(rename = "phoenix")]
    SentenceLevelPhoenix,
    /// Notation entries carrying a writing-system string per sign.
    #[serde(rename = "signwriting")]
    NotationLevel,
}

impl SourceTag {
    /// All source tags in resolution priority order.
    pub const PRIORITY: [SourceTag; 4] = [
        SourceTag::WordLevel,
        SourceTag::SentenceLevel,
        SourceTag::SentenceLevelPhoenix,
        SourceTag::NotationLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::WordLevel => "wlasl",
            SourceTag::SentenceLevel => "how2sign",
            SourceTag::SentenceLevelPhoenix => "phoenix",
            SourceTag::NotationLevel => "signwriting",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Label Normalization
// =============================================================================

/// Normalizes free-form text into a canonical label token.
///
/// Runs of hyphens, underscores, and whitespace collapse to a single
/// underscore; leading/trailing separators are trimmed; the result is
/// uppercased.
pub fn normalize_label(raw: &str) -> Label {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            if !out.is_empty() {
                pending_sep = true;
            }
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(ch.to_uppercase());
        }
    }
    out
}
