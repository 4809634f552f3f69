//! SignBank Core Library
//!
//! Ingestion engine for a multi-source sign-language video corpus.
//! The pipeline loads heterogeneous per-source annotations, scans the
//! configured media roots, transcodes and thumbnails every discovered clip,
//! and emits a versioned lookup index keyed by (dialect, sign label).
//!
//! Downstream consumers (lookup services, verification utilities) only read
//! the index document this library produces; they are not part of this crate.

pub mod core;

pub use crate::core::{PipelineError, PipelineResult};
