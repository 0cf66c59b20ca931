//! Complete ink pipeline
//!
//! This module connects:
//! - Input handling (pen events from the acquisition layer)
//! - Segmentation (stroke boundaries with flicker filtering)
//! - Delayed commit (cancellable finalisation of lifted strokes)
//! - Stroke storage (committed strokes, preview slot, listeners)
//!
//! The ingest side is synchronous and owned by one producer. Consumers use
//! the shared [`StrokeStore`] from any thread.

mod commit;
mod segmenter;
mod stroke;

use std::sync::Arc;

use stylus_config::InkConfig;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::log::{ContentChange, ListenerId, StrokeStore};
use crate::runtime::runtime_handle;
use crate::snapshot::InkSnapshot;
use crate::types::Stroke;

pub use commit::{CommitHandle, CommitStatus, DelayedCommitScheduler};
pub use segmenter::{IgnoreReason, SegmentOutcome, SegmenterState, StrokeSegmenter};

/// Ingest-to-store pipeline for one pen
///
/// 1. Events come in via `ingest` (or `pen_down`, `pen_move`, `pen_up`)
/// 2. The segmenter groups samples into candidate strokes
/// 3. Pen-ups schedule a delayed commit that a quick pen-down can cancel
/// 4. Committed strokes and previews land in the store
/// 5. Listeners are told something changed
pub struct InkEngine {
    config: InkConfig,
    pub(crate) segmenter: StrokeSegmenter,
    store: Arc<StrokeStore>,
}

impl std::fmt::Debug for InkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkEngine")
            .field("config", &self.config)
            .field("state", &self.segmenter.state())
            .field("store", &self.store)
            .finish()
    }
}

impl InkEngine {
    /// Create an engine, running background work on the ambient tokio
    /// runtime or a shared one if there is none.
    pub fn new(config: InkConfig) -> Result<Self, EngineError> {
        let runtime = runtime_handle()?;
        Self::with_runtime(config, &runtime)
    }

    /// Create an engine whose commit worker runs on `runtime`.
    pub fn with_runtime(config: InkConfig, runtime: &Handle) -> Result<Self, EngineError> {
        config.validate()?;
        let store = Arc::new(StrokeStore::new()?);
        let segmenter = StrokeSegmenter::new(&config, Arc::clone(&store), runtime);

        info!(
            error_window_ms = config.error_window_ms,
            commit_delay_ms = config.commit_delay_ms,
            preview_distance = config.preview_distance,
            "ink engine started"
        );

        Ok(Self {
            config,
            segmenter,
            store,
        })
    }

    pub fn config(&self) -> &InkConfig {
        &self.config
    }

    /// Shared store for consumer threads
    pub fn store(&self) -> Arc<StrokeStore> {
        Arc::clone(&self.store)
    }

    pub fn segmenter(&self) -> &StrokeSegmenter {
        &self.segmenter
    }

    /// All committed strokes, in commit order
    pub fn all_strokes(&self) -> Vec<Stroke> {
        self.store.all()
    }

    /// Committed strokes not returned by a previous call
    pub fn new_strokes_since_last_poll(&self) -> Vec<Stroke> {
        self.store.poll_new()
    }

    pub fn stroke_count(&self) -> usize {
        self.store.stroke_count()
    }

    /// End time of the most recently committed stroke
    pub fn last_stroke_end_time(&self) -> Option<u64> {
        self.store.last_stroke_end_time()
    }

    /// Time of the most recent pen-up seen by the segmenter
    pub fn last_pen_up_time(&self) -> Option<u64> {
        self.segmenter.last_pen_up_time()
    }

    /// In-progress stroke published for display, if any
    pub fn preview(&self) -> Option<Stroke> {
        self.store.preview()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ContentChange) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe_all(&self) {
        self.store.unsubscribe_all();
    }

    /// Change the preview threshold at runtime (`None` disables previews)
    pub fn set_preview_distance(&mut self, distance: Option<f64>) {
        self.segmenter.set_preview_distance(distance);
        self.config.preview_distance = self.segmenter.preview_distance().unwrap_or(0.0);
    }

    /// Drop the stroke in progress and empty the store.
    pub fn clear(&mut self) {
        self.segmenter.reset();
        self.store.clear();
    }

    pub fn export_snapshot(&self) -> InkSnapshot {
        self.store.export_snapshot()
    }
}

impl Drop for InkEngine {
    fn drop(&mut self) {
        // A listener holding the store would otherwise keep the store, and
        // with it the dispatcher thread, alive forever.
        self.store.unsubscribe_all();
        debug!("ink engine dropped, listeners released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_engine_creation() {
        let engine = InkEngine::new(InkConfig::default()).unwrap();
        assert_eq!(engine.stroke_count(), 0);
        assert_eq!(engine.segmenter().state(), SegmenterState::Idle);
        assert_eq!(engine.last_stroke_end_time(), None);
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let config = InkConfig {
            error_window_ms: 30,
            commit_delay_ms: 25,
            ..InkConfig::default()
        };
        assert!(matches!(
            InkEngine::new(config),
            Err(EngineError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_stroke() {
        let mut engine = InkEngine::new(InkConfig::default()).unwrap();

        engine.pen_down(100.0, 100.0, 200, 0);
        engine.pen_move(150.0, 100.0, 200, 8);
        engine.pen_up(150.0, 100.0, 16);
        assert_eq!(engine.segmenter().state(), SegmenterState::Lifted);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.stroke_count(), 1);
        assert_eq!(engine.last_stroke_end_time(), Some(8));
        assert_eq!(engine.last_pen_up_time(), Some(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_clear() {
        let mut engine = InkEngine::new(InkConfig::default()).unwrap();
        engine.pen_down(0.0, 0.0, 128, 0);
        engine.pen_up(0.0, 0.0, 10);
        tokio::time::sleep(Duration::from_millis(50)).await;

        engine.pen_down(0.0, 0.0, 128, 100);
        engine.pen_up(0.0, 0.0, 110);
        engine.clear();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.stroke_count(), 0);
        assert!(engine.all_strokes().is_empty());
        assert!(engine.new_strokes_since_last_poll().is_empty());
        assert_eq!(engine.segmenter().state(), SegmenterState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_preview_distance_updates_config() {
        let mut engine = InkEngine::new(InkConfig::default()).unwrap();
        engine.set_preview_distance(Some(25.0));
        assert!(engine.config().preview_enabled());
        engine.set_preview_distance(None);
        assert!(!engine.config().preview_enabled());
    }
}
