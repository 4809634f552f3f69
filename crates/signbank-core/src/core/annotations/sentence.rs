//! Sentence-Level Annotation Loader
//!
//! Reads delimited text files. The delimiter is chosen per file by probing
//! the first line for a pipe character, falling back to comma; the first
//! line is always treated as a header and skipped.
//!
//! Two column schemas are supported, selected by filename substring:
//! - files whose name contains "phoenix": `ordinal|clip-id|annotation text`,
//!   with the label sequence derived by whitespace-splitting the text
//! - everything else (How2Sign-style): `clip-id, sentence[, label sequence]`
//!   where the optional third column is a space-delimited gloss sequence

use std::path::{Path, PathBuf};

use super::{expand_files, read_annotation_file, Annotation, AnnotationTable};
use crate::core::types::{normalize_label, Dialect, SourceTag};
use crate::core::PipelineResult;

/// Loads sentence-level annotation files into one table.
pub(super) fn load(
    paths: &[PathBuf],
    dialect: Dialect,
    source: SourceTag,
) -> PipelineResult<AnnotationTable> {
    let mut table = AnnotationTable::new();

    for path in expand_files(paths)? {
        let raw = read_annotation_file(&path)?;
        load_file(&path, &raw, dialect, source, &mut table);
    }

    Ok(table)
}

fn load_file(
    path: &Path,
    raw: &str,
    dialect: Dialect,
    source: SourceTag,
    table: &mut AnnotationTable,
) {
    let mut lines = raw.lines();

    // Header row, also used to probe the delimiter.
    let Some(header) = lines.next() else {
        return;
    };
    let delimiter = if header.contains('|') { '|' } else { ',' };

    let phoenix_schema = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("phoenix"))
        .unwrap_or(false);

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let annotation = if phoenix_schema {
            parse_phoenix_row(line, dialect, source)
        } else {
            parse_sentence_row(line, delimiter, dialect, source)
        };

        if let Some((clip_id, annotation)) = annotation {
            table.insert(clip_id, annotation);
        }
    }
}

/// `ordinal|clip-id|annotation text`
fn parse_phoenix_row(
    line: &str,
    dialect: Dialect,
    source: SourceTag,
) -> Option<(String, Annotation)> {
    let mut cols = line.splitn(3, '|');
    let _ordinal = cols.next()?;
    let clip_id = cols.next()?.trim();
    let text = cols.next()?.trim();
    if clip_id.is_empty() || text.is_empty() {
        return None;
    }

    let sequence: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let label = normalize_label(&sequence.join("_"));

    Some((
        clip_id.to_string(),
        Annotation {
            label,
            dialect,
            source,
            category: None,
            sentence: None,
            label_sequence: Some(sequence),
            notation: None,
            split: None,
            bbox: None,
        },
    ))
}

/// `clip-id <delim> sentence [<delim> space-delimited label sequence]`
fn parse_sentence_row(
    line: &str,
    delimiter: char,
    dialect: Dialect,
    source: SourceTag,
) -> Option<(String, Annotation)> {
    let mut cols = line.splitn(3, delimiter);
    let clip_id = cols.next()?.trim();
    let sentence = cols.next()?.trim();
    if clip_id.is_empty() || sentence.is_empty() {
        return None;
    }

    let sequence: Option<Vec<String>> = cols.next().and_then(|col| {
        let tokens: Vec<String> = col.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            None
        } else {
            Some(tokens)
        }
    });

    let label = match &sequence {
        Some(tokens) => normalize_label(&tokens.join("_")),
        None => normalize_label(sentence),
    };

    Some((
        clip_id.to_string(),
        Annotation {
            label,
            dialect,
            source,
            category: None,
            sentence: Some(sentence.to_string()),
            label_sequence: sequence,
            notation: None,
            split: None,
            bbox: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_phoenix_schema_pipe_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "phoenix_train.csv",
            "id|name|annotation\n7|v42|A SENTENCE HERE\n8|v43|RAIN TOMORROW\n",
        );

        let table = load(&[path], Dialect::Dgs, SourceTag::SentenceLevelPhoenix).unwrap();
        assert_eq!(table.len(), 2);

        let v42 = &table["v42"];
        assert_eq!(
            v42.label_sequence,
            Some(vec!["A".to_string(), "SENTENCE".to_string(), "HERE".to_string()])
        );
        assert_eq!(v42.label, "A_SENTENCE_HERE");
        assert_eq!(v42.dialect, Dialect::Dgs);
        assert!(v42.sentence.is_none());
    }

    #[test]
    fn test_how2sign_schema_with_sequence_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "how2sign_val.csv",
            "id,sentence,glosses\nc1,nice to meet you,NICE MEET YOU\nc2,good morning\n",
        );

        let table = load(&[path], Dialect::Asl, SourceTag::SentenceLevel).unwrap();
        assert_eq!(table.len(), 2);

        let c1 = &table["c1"];
        assert_eq!(c1.sentence.as_deref(), Some("nice to meet you"));
        assert_eq!(
            c1.label_sequence,
            Some(vec!["NICE".to_string(), "MEET".to_string(), "YOU".to_string()])
        );
        assert_eq!(c1.label, "NICE_MEET_YOU");

        // Two-column row: label derived from the sentence.
        let c2 = &table["c2"];
        assert!(c2.label_sequence.is_none());
        assert_eq!(c2.label, "GOOD_MORNING");
    }

    #[test]
    fn test_header_is_always_skipped() {
        let dir = TempDir::new().unwrap();
        // Header looks like a data row; it must still be skipped.
        let path = write_file(&dir, "how2sign.csv", "h1,hello there\nc1,real row\n");

        let table = load(&[path], Dialect::Asl, SourceTag::SentenceLevel).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains_key("c1"));
    }

    #[test]
    fn test_delimiter_probe_prefers_pipe() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "how2sign_pipe.csv",
            "id|sentence\nc9|hello, nice day\n",
        );

        let table = load(&[path], Dialect::Asl, SourceTag::SentenceLevel).unwrap();
        // Pipe split keeps the comma inside the sentence intact.
        assert_eq!(table["c9"].sentence.as_deref(), Some("hello, nice day"));
    }

    #[test]
    fn test_short_and_empty_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "how2sign.csv",
            "id,sentence\n\nonly_one_column\nc1,ok\n",
        );

        let table = load(&[path], Dialect::Asl, SourceTag::SentenceLevel).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_multiple_files_merge() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "how2sign_train.csv", "id,s\na1,alpha\n");
        let b = write_file(&dir, "how2sign_test.csv", "id,s\nb1,beta\n");

        let table = load(&[a, b], Dialect::Asl, SourceTag::SentenceLevel).unwrap();
        assert_eq!(table.len(), 2);
    }
}
