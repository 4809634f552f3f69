//! SignBank Error Definitions
//!
//! Defines error types used throughout the pipeline.
//!
//! Only `Precondition` is fatal to a run. Every other kind is caught at the
//! narrowest useful scope (per annotation source, per clip, per write) and
//! converted to counters or log output; nothing unwinds past the batch loop.

use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    // =========================================================================
    // Fatal startup errors
    // =========================================================================
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // Per-source annotation errors
    // =========================================================================
    #[error("Annotation source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Annotation parse failed: {0}")]
    ParseFailure(String),

    // =========================================================================
    // Per-clip errors
    // =========================================================================
    #[error("Metadata probe failed: {0}")]
    ProbeFailure(String),

    #[error("Asset generation failed: {0}")]
    AssetFailure(String),

    // =========================================================================
    // Persistence errors
    // =========================================================================
    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),

    // =========================================================================
    // General errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline result type
pub type PipelineResult<T> = Result<T, PipelineError>;
