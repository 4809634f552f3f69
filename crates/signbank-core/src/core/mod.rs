//! SignBank Core Engine
//!
//! All pipeline business logic lives here:
//! - `annotations`: per-source annotation loading and reconciliation
//! - `scanner`: media root traversal and clip discovery
//! - `media`: external prober/transcoder capability interface
//! - `pipeline`: per-clip processing and batch scheduling
//! - `index`: persisted lookup index construction
//! - `settings`: pipeline configuration
//! - `fs`: crash-tolerant file writes

pub mod annotations;
pub mod error;
pub mod fs;
pub mod index;
pub mod media;
pub mod pipeline;
pub mod scanner;
pub mod settings;
pub mod types;

pub use error::{PipelineError, PipelineResult};
pub use types::{ClipId, Dialect, Label, SourceTag};
