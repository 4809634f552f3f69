//! Word-Level Annotation Loader
//!
//! Parses WLASL-shaped JSON: a sequence of label groups, each holding a list
//! of clip instances. Every instance with a clip id becomes one annotation;
//! later duplicates of the same clip id overwrite earlier ones.

use std::path::PathBuf;

use serde::Deserialize;

use super::{expand_files, read_annotation_file, Annotation, AnnotationTable};
use crate::core::types::{normalize_label, Dialect, SourceTag};
use crate::core::{PipelineError, PipelineResult};

#[derive(Debug, Deserialize)]
struct WordGroup {
    gloss: String,
    #[serde(default)]
    instances: Vec<WordInstance>,
}

#[derive(Debug, Deserialize)]
struct WordInstance {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    split: Option<String>,
    #[serde(default)]
    bbox: Option<Vec<i32>>,
}

/// Loads word-level annotation files into one table.
pub(super) fn load(paths: &[PathBuf], dialect: Dialect) -> PipelineResult<AnnotationTable> {
    let mut table = AnnotationTable::new();

    for path in expand_files(paths)? {
        let raw = read_annotation_file(&path)?;
        let groups: Vec<WordGroup> = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::ParseFailure(format!("{}: {e}", path.display()))
        })?;

        for group in groups {
            let label = normalize_label(&group.gloss);
            for instance in group.instances {
                let Some(clip_id) = instance.video_id else {
                    continue;
                };
                // Last write wins for duplicate clip ids.
                table.insert(
                    clip_id,
                    Annotation {
                        label: label.clone(),
                        dialect,
                        source: SourceTag::WordLevel,
                        category: None,
                        sentence: None,
                        label_sequence: None,
                        notation: None,
                        split: instance.split,
                        bbox: instance.bbox,
                    },
                );
            }
        }
    }

    Ok(table)
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
    fn test_load_basic_groups() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "wlasl.json",
            r#"[
                {"gloss": "hello", "instances": [
                    {"video_id": "v1", "split": "train", "bbox": [10, 20, 300, 400]},
                    {"video_id": "v2"}
                ]},
                {"gloss": "thank you", "instances": [{"video_id": "v3"}]}
            ]"#,
        );

        let table = load(&[path], Dialect::Asl).unwrap();
        assert_eq!(table.len(), 3);

        let v1 = &table["v1"];
        assert_eq!(v1.label, "HELLO");
        assert_eq!(v1.dialect, Dialect::Asl);
        assert_eq!(v1.source, SourceTag::WordLevel);
        assert_eq!(v1.split.as_deref(), Some("train"));
        assert_eq!(v1.bbox, Some(vec![10, 20, 300, 400]));

        assert_eq!(table["v3"].label, "THANK_YOU");
    }

    #[test]
    fn test_instance_without_clip_id_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "wlasl.json",
            r#"[{"gloss": "book", "instances": [{"split": "test"}, {"video_id": "v9"}]}]"#,
        );

        let table = load(&[path], Dialect::Asl).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains_key("v9"));
    }

    #[test]
    fn test_duplicate_clip_id_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "wlasl.json",
            r#"[
                {"gloss": "first", "instances": [{"video_id": "dup"}]},
                {"gloss": "second", "instances": [{"video_id": "dup"}]}
            ]"#,
        );

        let table = load(&[path], Dialect::Asl).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["dup"].label, "SECOND");
    }

    #[test]
    fn test_malformed_json_is_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "wlasl.json", r#"{"gloss": "not an array"}"#);

        let err = load(&[path], Dialect::Asl).unwrap_err();
        assert!(matches!(err, PipelineError::ParseFailure(_)));
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = load(&[PathBuf::from("/nope/wlasl.json")], Dialect::Asl).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    }
}
