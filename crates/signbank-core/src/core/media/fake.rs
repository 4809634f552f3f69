//! In-Memory Media Tools
//!
//! [`MediaTools`] adapter with no external processes. Thumbnails and
//! transcodes write small placeholder files so on-disk existence checks
//! behave like the real adapter. Tests configure per-path failures and read
//! call counters to assert how often each tool was invoked.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{MediaError, MediaResult, MediaTools, ProbeReport, QualityPreset};

/// Fake adapter for tests
#[derive(Default)]
pub struct FakeTools {
    reports: Mutex<HashMap<PathBuf, ProbeReport>>,
    fail_probe: AtomicBool,
    fail_transcode_for: Mutex<HashSet<PathBuf>>,
    fail_thumbnail_for: Mutex<HashSet<PathBuf>>,

    /// Number of probe calls made
    pub probe_calls: AtomicUsize,
    /// Number of thumbnail calls made
    pub thumbnail_calls: AtomicUsize,
    /// Number of transcode calls made
    pub transcode_calls: AtomicUsize,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the report returned when probing `input`.
    pub fn set_report(&self, input: impl Into<PathBuf>, report: ProbeReport) {
        self.reports.lock().unwrap().insert(input.into(), report);
    }

    /// Makes every probe call fail.
    pub fn fail_probes(&self) {
        self.fail_probe.store(true, Ordering::SeqCst);
    }

    /// Makes transcodes of `input` fail.
    pub fn fail_transcode_for(&self, input: impl Into<PathBuf>) {
        self.fail_transcode_for.lock().unwrap().insert(input.into());
    }

    /// Makes thumbnail extraction for `input` fail.
    pub fn fail_thumbnail_for(&self, input: impl Into<PathBuf>) {
        self.fail_thumbnail_for.lock().unwrap().insert(input.into());
    }

    /// Total tool invocations across all three capabilities.
    pub fn total_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
            + self.thumbnail_calls.load(Ordering::SeqCst)
            + self.transcode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn probe(&self, input: &Path) -> MediaResult<ProbeReport> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(MediaError::ProbeError("probe disabled".to_string()));
        }
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(input)
            .cloned()
            .unwrap_or_else(|| ProbeReport {
                duration_secs: 3.5,
                width: 1920,
                height: 1080,
                frame_rate: 30,
                codec: "h264".to_string(),
            }))
    }

    async fn thumbnail(&self, input: &Path, _offset_secs: f64, output: &Path) -> MediaResult<()> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_thumbnail_for.lock().unwrap().contains(input) {
            return Err(MediaError::ExecutionFailed(
                "thumbnail failure injected".to_string(),
            ));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, b"jpeg")?;
        Ok(())
    }

    async fn transcode(
        &self,
        input: &Path,
        preset: &QualityPreset,
        output: &Path,
    ) -> MediaResult<()> {
        self.transcode_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transcode_for.lock().unwrap().contains(input) {
            return Err(MediaError::ExecutionFailed(
                "transcode failure injected".to_string(),
            ));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, format!("video@{}", preset.name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fake_probe_defaults_and_overrides() {
        let tools = FakeTools::new();
        let report = tools.probe(Path::new("/a.mp4")).await.unwrap();
        assert_eq!(report.codec, "h264");

        tools.set_report(
            "/b.mp4",
            ProbeReport {
                duration_secs: 9.0,
                ..ProbeReport::default()
            },
        );
        let report = tools.probe(Path::new("/b.mp4")).await.unwrap();
        assert_eq!(report.duration_secs, 9.0);
        assert_eq!(tools.probe_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fake_transcode_writes_placeholder() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("asl").join("HELLO_720p.mp4");

        let tools = FakeTools::new();
        tools
            .transcode(Path::new("/in.mp4"), &QualityPreset::p720(), &out)
            .await
            .unwrap();
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_fake_injected_failures() {
        let tools = FakeTools::new();
        tools.fail_transcode_for("/bad.mp4");

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.mp4");
        let err = tools
            .transcode(Path::new("/bad.mp4"), &QualityPreset::p720(), &out)
            .await;
        assert!(err.is_err());
        assert!(!out.exists());
    }
}
