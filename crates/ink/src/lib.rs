//! Stylus ink engine - pen sample segmentation into strokes
//!
//! This crate turns a stream of pen events into committed strokes:
//! - [`types::Stroke`] - An immutable, ordered run of [`types::Sample`]s
//! - [`pipeline::StrokeSegmenter`] - Stroke boundaries with pen-up flicker
//!   filtering
//! - [`pipeline::DelayedCommitScheduler`] - Cancellable delayed commits
//! - [`log`] - Stroke storage, previews and change listeners
//! - [`pipeline::InkEngine`] - The complete ingest-to-store pipeline
//! - [`snapshot`] - Export contract for persistence

pub mod constants;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod runtime;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use constants::*;
pub use error::*;
pub use log::*;
pub use pipeline::*;
pub use snapshot::*;
pub use types::*;
pub use validation::*;

pub use stylus_config::{ConfigError, InkConfig};
