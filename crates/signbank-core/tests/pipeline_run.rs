//! Full pipeline runs against a fixture corpus on a temp filesystem,
//! using the in-memory media tools adapter.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::TempDir;

use signbank_core::core::media::{FakeTools, MediaTools};
use signbank_core::core::pipeline::{self, RunReport};
use signbank_core::core::settings::{DatasetConfig, PipelineConfig};
use signbank_core::core::types::{Dialect, SourceTag};

struct Fixture {
    _root: TempDir,
    config: PipelineConfig,
    wlasl_media: PathBuf,
}

/// Lays out one word-level sub-dataset, one notation sub-dataset sharing a
/// clip id with it, and a catch-all root with an unannotated clip.
fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let base = root.path();

    let wlasl_media = base.join("raw/wlasl/videos");
    std::fs::create_dir_all(&wlasl_media).unwrap();
    std::fs::write(wlasl_media.join("v1.mp4"), "v").unwrap();
    std::fs::write(wlasl_media.join("v2.mp4"), "v").unwrap();
    std::fs::write(
        base.join("raw/wlasl/WLASL.json"),
        r#"[
            {"gloss": "hello", "instances": [{"video_id": "v1", "split": "train"}]},
            {"gloss": "water", "instances": [{"video_id": "v2"}]}
        ]"#,
    )
    .unwrap();

    let notation_media = base.join("raw/signwriting/videos");
    std::fs::create_dir_all(&notation_media).unwrap();
    std::fs::write(notation_media.join("n1.mp4"), "v").unwrap();
    std::fs::write(
        base.join("raw/signwriting/notation.json"),
        // v1 collides with the word-level table; the word-level label wins.
        r#"[
            {"video_id": "n1", "gloss": "tree", "notation": "M500x500S20000"},
            {"video_id": "v1", "gloss": "wrong hello", "notation": "M1x1S1"}
        ]"#,
    )
    .unwrap();

    let extra = base.join("raw/extra");
    std::fs::create_dir_all(extra.join("bsl")).unwrap();
    std::fs::write(extra.join("bsl").join("sign_GOOD-MORNING_v2_720p.mp4"), "v").unwrap();

    let mut config = PipelineConfig::default();
    config.datasets = vec![
        DatasetConfig {
            source: SourceTag::WordLevel,
            media_dir: wlasl_media.clone(),
            annotation_paths: vec![base.join("raw/wlasl/WLASL.json")],
            default_dialect: Dialect::Asl,
        },
        DatasetConfig {
            source: SourceTag::NotationLevel,
            media_dir: notation_media,
            annotation_paths: vec![base.join("raw/signwriting/notation.json")],
            default_dialect: Dialect::Asl,
        },
    ];
    config.extra_media_dir = extra;
    config.processed_dir = base.join("processed");
    config.thumbnail_dir = base.join("thumbnails");
    config.index_path = base.join("metadata/video_index.json");
    config.normalize();

    Fixture {
        _root: root,
        config,
        wlasl_media,
    }
}

async fn run(fixture: &Fixture, tools: &Arc<FakeTools>) -> RunReport {
    pipeline::run(
        &fixture.config,
        Arc::clone(tools) as Arc<dyn MediaTools>,
        Arc::new(AtomicBool::new(false)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn full_run_builds_index_from_all_sources() {
    let fixture = fixture();
    let tools = Arc::new(FakeTools::new());

    let report = run(&fixture, &tools).await;
    assert_eq!(report.stats.processed, 4);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.skipped, 0);
    assert_eq!(report.total_signs, 4);
    assert_eq!(report.dialect_counts["ASL"], 3);
    assert_eq!(report.dialect_counts["BSL"], 1);
    assert_eq!(report.source_counts["wlasl"], 2);
    assert_eq!(report.source_counts["signwriting"], 1);
    assert_eq!(report.source_counts["extra"], 1);

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.config.index_path).unwrap())
            .unwrap();

    // Word-level annotation drives the ASL/HELLO entry.
    let hello = &doc["ASL"]["HELLO"];
    assert_eq!(hello["metadata"]["videoId"], "v1");
    assert!(hello["videoPath"]
        .as_str()
        .unwrap()
        .ends_with("HELLO_720p.mp4"));

    // The colliding notation annotation for v1 lost to the word-level table.
    assert!(hello.get("context").is_none() || hello["context"].get("notation").is_none());

    // Notation entry carries its context block.
    assert_eq!(doc["ASL"]["TREE"]["context"]["notation"], "M500x500S20000");

    // Catch-all clip: dialect from the bsl/ directory, label from the stem.
    assert_eq!(doc["BSL"]["GOOD_MORNING"]["source"], "extra");

    // Reserved record sits beside the dialects and is not a dialect.
    assert_eq!(doc["_meta"]["totalSigns"], 4);
    assert!(doc["_meta"]["dialectCounts"].get("_meta").is_none());
}

#[tokio::test]
async fn every_indexed_entry_resolves_to_a_file_on_disk() {
    let fixture = fixture();
    let tools = Arc::new(FakeTools::new());
    run(&fixture, &tools).await;

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.config.index_path).unwrap())
            .unwrap();

    for (key, labels) in doc.as_object().unwrap() {
        if key == "_meta" {
            continue;
        }
        for (label, entry) in labels.as_object().unwrap() {
            let video = entry["videoPath"].as_str().unwrap();
            assert!(
                std::path::Path::new(video).exists(),
                "{key}/{label} primary asset missing"
            );
            for variant in entry["variants"].as_object().unwrap().values() {
                assert!(std::path::Path::new(variant.as_str().unwrap()).exists());
            }
        }
    }
}

#[tokio::test]
async fn rerun_is_idempotent_with_zero_tool_calls() {
    let fixture = fixture();
    let tools = Arc::new(FakeTools::new());

    run(&fixture, &tools).await;
    let first_bytes = std::fs::read(&fixture.config.index_path).unwrap();
    let calls_after_first = tools.total_calls();

    let report = run(&fixture, &tools).await;
    assert_eq!(report.stats.processed, 0);
    assert_eq!(report.stats.skipped, 4);

    // No probe/thumbnail/transcode calls, byte-identical document.
    assert_eq!(tools.total_calls(), calls_after_first);
    let second_bytes = std::fs::read(&fixture.config.index_path).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn transcode_failure_is_isolated_to_one_clip() {
    let fixture = fixture();
    let tools = Arc::new(FakeTools::new());
    tools.fail_transcode_for(fixture.wlasl_media.join("v2.mp4"));

    let report = run(&fixture, &tools).await;
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.processed, 3);

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.config.index_path).unwrap())
            .unwrap();
    // The failed clip got no entry; the rest of the batch completed.
    assert!(doc["ASL"].get("WATER").is_none());
    assert!(doc["ASL"].get("HELLO").is_some());
}

#[tokio::test]
async fn rebuild_discards_the_prior_index() {
    let mut fixture = fixture();
    let tools = Arc::new(FakeTools::new());
    run(&fixture, &tools).await;

    // Remove one source clip, then rebuild: the stale entry disappears.
    std::fs::remove_file(fixture.wlasl_media.join("v2.mp4")).unwrap();
    fixture.config.processing.rebuild = true;
    let report = run(&fixture, &tools).await;

    assert_eq!(report.total_signs, 3);
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.config.index_path).unwrap())
            .unwrap();
    assert!(doc["ASL"].get("WATER").is_none());
}

#[tokio::test]
async fn limit_processes_only_the_first_clips() {
    let mut fixture = fixture();
    fixture.config.processing.limit = Some(1);
    let tools = Arc::new(FakeTools::new());

    let report = run(&fixture, &tools).await;
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.total_signs, 1);
}
