//! Media Tooling Module
//!
//! Narrow capability interface over the external prober and transcoder:
//! - `probe` returns structured stream metadata
//! - `thumbnail` extracts a single frame
//! - `transcode` produces a scaled/padded quality variant
//!
//! One real adapter shells out to ffmpeg/ffprobe (`FfmpegTools`); an
//! in-memory adapter (`FakeTools`) backs unit and integration tests so the
//! pipeline is testable without the binaries installed.

mod detection;
mod fake;
mod ffmpeg;
mod presets;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::PipelineError;

pub use detection::{detect_tools, require_tools, MediaToolPaths};
pub use fake::FakeTools;
pub use ffmpeg::FfmpegTools;
pub use presets::QualityPreset;

/// Media tool error types
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media tools not found. Install ffmpeg and ffprobe and ensure they are on PATH.")]
    NotFound,

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output path error: {0}")]
    OutputError(String),

    #[error("Probe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout: tool invocation took too long")]
    Timeout,
}

pub type MediaResult<T> = Result<T, MediaError>;

/// Classifies a tool error into the pipeline taxonomy at the media
/// boundary: missing binaries are a fatal precondition, probe problems are
/// recoverable per clip, everything else is a failed asset.
impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        match &e {
            MediaError::NotFound => PipelineError::Precondition(e.to_string()),
            MediaError::ProbeError(_) | MediaError::ParseError(_) => {
                PipelineError::ProbeFailure(e.to_string())
            }
            _ => PipelineError::AssetFailure(e.to_string()),
        }
    }
}

/// Technical metadata extracted by the prober for one clip.
///
/// `Default` is the substitute record used when a probe fails: processing
/// continues with these values rather than failing the clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate, rounded to the nearest integer
    pub frame_rate: u32,
    /// Codec name (e.g. "h264")
    pub codec: String,
}

impl Default for ProbeReport {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            width: 1280,
            height: 720,
            frame_rate: 30,
            codec: "unknown".to_string(),
        }
    }
}

impl ProbeReport {
    /// "WxH" resolution string as persisted in the index.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Capability interface over the external media tools.
///
/// All invocations are blocking from the clip's point of view; callers
/// isolate failures per clip and never let them abort a batch.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Probes `input` for stream/container metadata.
    async fn probe(&self, input: &Path) -> MediaResult<ProbeReport>;

    /// Extracts a single frame at `offset_secs` into `output` (JPEG).
    async fn thumbnail(&self, input: &Path, offset_secs: f64, output: &Path) -> MediaResult<()>;

    /// Transcodes `input` to the preset's exact resolution, preserving
    /// aspect ratio via letterbox/pillarbox padding.
    async fn transcode(&self, input: &Path, preset: &QualityPreset, output: &Path)
        -> MediaResult<()>;
}
