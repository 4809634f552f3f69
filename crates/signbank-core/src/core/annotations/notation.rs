//! Notation-Level Annotation Loader
//!
//! Accepts two JSON shapes:
//! - a sequence of entries, each with a clip id, label, and notation string
//! - an object keyed directly by clip id
//!
//! The label comes from a dedicated `label`/`gloss` field, falling back to
//! `sign_name` when absent.

use std::path::PathBuf;

use serde_json::Value;

use super::{expand_files, read_annotation_file, Annotation, AnnotationTable};
use crate::core::types::{normalize_label, Dialect, SourceTag};
use crate::core::{PipelineError, PipelineResult};

/// Loads notation annotation files into one table.
pub(super) fn load(paths: &[PathBuf], dialect: Dialect) -> PipelineResult<AnnotationTable> {
    let mut table = AnnotationTable::new();

    for path in expand_files(paths)? {
        let raw = read_annotation_file(&path)?;
        let json: Value = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::ParseFailure(format!("{}: {e}", path.display()))
        })?;

        match json {
            Value::Array(entries) => {
                for entry in entries {
                    if let Some((clip_id, annotation)) = parse_entry(&entry, None, dialect) {
                        table.insert(clip_id, annotation);
                    }
                }
            }
            Value::Object(map) => {
                for (clip_id, entry) in map {
                    if let Some((clip_id, annotation)) =
                        parse_entry(&entry, Some(clip_id), dialect)
                    {
                        table.insert(clip_id, annotation);
                    }
                }
            }
            _ => {
                return Err(PipelineError::ParseFailure(format!(
                    "{}: expected array or object",
                    path.display()
                )));
            }
        }
    }

    Ok(table)
}

fn parse_entry(entry: &Value, key: Option<String>, dialect: Dialect) -> Option<(String, Annotation)> {
    let clip_id = match key {
        Some(k) => k,
        None => field(entry, &["video_id", "id"])?,
    };

    // Dedicated label field, with "sign name" as fallback.
    let raw_label = field(entry, &["label", "gloss", "sign_name"])?;
    let label = normalize_label(&raw_label);
    if label.is_empty() {
        return None;
    }

    Some((
        clip_id,
        Annotation {
            label,
            dialect,
            source: SourceTag::NotationLevel,
            category: field(entry, &["category"]),
            sentence: None,
            label_sequence: None,
            notation: field(entry, &["notation"]),
            split: None,
            bbox: None,
        },
    ))
}

fn field(entry: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| entry.get(name))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_array_shape() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "signwriting.json",
            r#"[
                {"video_id": "n1", "gloss": "hello", "notation": "M518x529S14c20"},
                {"id": "n2", "label": "water", "notation": "M510x520S10000", "category": "nature"}
            ]"#,
        );

        let table = load(&[path], Dialect::Asl).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["n1"].label, "HELLO");
        assert_eq!(table["n1"].notation.as_deref(), Some("M518x529S14c20"));
        assert_eq!(table["n2"].category.as_deref(), Some("nature"));
    }

    #[test]
    fn test_object_shape_keyed_by_clip_id() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "signwriting.json",
            r#"{
                "n3": {"gloss": "tree", "notation": "M500x500S20000"},
                "n4": {"sign_name": "mountain top", "notation": "M501x501S20001"}
            }"#,
        );

        let table = load(&[path], Dialect::Bsl).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["n3"].label, "TREE");
        assert_eq!(table["n3"].dialect, Dialect::Bsl);
        // sign_name fallback, normalized.
        assert_eq!(table["n4"].label, "MOUNTAIN_TOP");
    }

    #[test]
    fn test_entry_without_label_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "signwriting.json",
            r#"[{"video_id": "n5", "notation": "M500x500S1"}]"#,
        );

        let table = load(&[path], Dialect::Asl).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_scalar_json_is_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "signwriting.json", "42");

        let err = load(&[path], Dialect::Asl).unwrap_err();
        assert!(matches!(err, PipelineError::ParseFailure(_)));
    }
}
